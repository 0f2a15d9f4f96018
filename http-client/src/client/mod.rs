mod call;
mod client;
mod error;
pub mod mock;
mod pacer;
mod request;
mod unmarshal;

pub use client::{Client, ClientBuilder, LastChance};
pub use error::{Error, Result};
pub use pacer::{Pacer, Ticker};
pub use request::{
    ArgValue, ChainedReader, FileAttachment, IntoArgValue, MultipartBody, MultipartClosed, Params, Rendered,
    Request, UnsupportedArgument,
};
pub use unmarshal::{from_json, from_xml, JsonUnmarshaller, ResponseUnmarshaller, XmlUnmarshaller};
