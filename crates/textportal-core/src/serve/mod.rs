mod dispatcher;
mod protocol;
mod server;

pub use dispatcher::ServingDispatcher;
pub use protocol::{
    decode_trigger, encode_trigger_payload, InboundRequest, OutboundResponse, TEXT_CONTENT_TYPE,
    UNAVAILABLE_MESSAGE, UPDATE_CACHE_ACTION,
};
pub use server::{router, HttpServer};
