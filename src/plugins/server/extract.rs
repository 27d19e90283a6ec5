use axum::{Json, extract::FromRequest};

use crate::error::Error;

/// JSON request body. Malformed bodies are rejected as validation errors
/// with the usual `{success, message}` shape.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(Error))]
pub struct Payload<T>(pub T);
