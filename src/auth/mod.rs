//! OAuth2 token handling for upstream vehicle apis.
//!
//! - `token`: bearer token and token endpoint response
//! - `provider`: app grant and stored refresh-token grant
//! - `transport`: authorized http client with refresh and a single retry on 401

pub mod provider;
pub mod token;
pub mod transport;
