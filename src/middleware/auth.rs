use actix_web::{dev::Payload, http::header::AUTHORIZATION, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::core::{AppError, Credentials};

/// Caller credentials taken from the inbound `Authorization` header.
///
/// Nothing is validated here; the upstream API decides what the token may see.
impl FromRequest for Credentials {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let credentials = match req.headers().get(AUTHORIZATION) {
            None => Credentials::anonymous(),
            Some(value) => match value.to_str() {
                Ok(header) => Credentials::from_header(header),
                Err(_) => {
                    return ready(Err(AppError::validation(
                        "Authorization header is not valid ASCII",
                    )))
                }
            },
        };

        ready(Ok(credentials))
    }
}
