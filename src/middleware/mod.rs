// Middleware module - security headers, CORS, body parsing, logging, error mapping

pub mod body_parser;
pub mod cors;
pub mod error_mapper;
pub mod request_logger;
pub mod security_headers;

pub use body_parser::{parse_body, ParsedBody, BODY_LIMIT};
pub use cors::cors_layer;
pub use error_mapper::{error_mapper_middleware, handle_panic};
pub use request_logger::{request_logger_middleware, LogFormat};
pub use security_headers::add_security_headers;
