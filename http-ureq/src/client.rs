use anyhow::Error as AnyError;
use log::debug;
use reqkit_http::{
    header::CONTENT_LENGTH, HeaderName, HeaderValue, HttpCaller, Request, Response, ResponseBody, ResponseError,
    ResponseErrorKind, ResponseResult, StatusCode, Uri, Version,
};
use std::{
    error::Error as StdError,
    fmt::Display,
    io::{Error as IoError, ErrorKind as IoErrorKind},
};
use ureq::{Agent, Error as UreqError, ErrorKind as UreqErrorKind, Request as UreqRequest, Response as UreqResponse};

/// Ureq 客户端
#[derive(Debug, Clone)]
pub struct Client {
    client: Agent,
}

impl Client {
    /// 创建 Ureq 客户端
    #[inline]
    pub fn new(client: Agent) -> Self {
        Self { client }
    }
}

impl From<Agent> for Client {
    #[inline]
    fn from(agent: Agent) -> Self {
        Self::new(agent)
    }
}

impl Default for Client {
    #[inline]
    fn default() -> Self {
        Self { client: ureq::agent() }
    }
}

impl HttpCaller for Client {
    fn call(&self, request: Request) -> ResponseResult {
        let url = request.url().to_owned();
        let ureq_request = make_ureq_request(&self.client, &request)?;
        let body = request.into_body();
        let result = if body.size() == Some(0) {
            ureq_request.call()
        } else {
            ureq_request.send(body)
        };
        match result {
            Ok(response) => make_response(response, &url),
            Err(UreqError::Status(code, response)) => {
                debug!("ureq received status {} from {}", code, url);
                make_response(response, &url)
            }
            Err(UreqError::Transport(transport)) => Err(from_transport_error(transport, &url)),
        }
    }
}

fn make_ureq_request(agent: &Agent, request: &Request) -> Result<UreqRequest, ResponseError> {
    let mut request_builder = agent.request(request.method().as_str(), &request.url().to_string());
    for (header_name, header_value) in request.headers() {
        let header_value = header_value
            .to_str()
            .map_err(|err| build_header_value_error(request.url(), &format!("{:?}", header_value), &err))?;
        request_builder = request_builder.set(header_name.as_str(), header_value);
    }
    if let Some(size) = request.body().size().filter(|&size| size > 0) {
        request_builder = request_builder.set(CONTENT_LENGTH.as_str(), &size.to_string());
    }
    Ok(request_builder)
}

fn make_response(response: UreqResponse, url: &Uri) -> ResponseResult {
    let mut response_builder = Response::builder();
    response_builder
        .status_code(
            StatusCode::from_u16(response.status())
                .map_err(|err| build_status_code_error(url, response.status(), &err))?,
        )
        .version(parse_http_version(response.http_version(), url)?);
    for header_name_str in response.headers_names().into_iter() {
        if let Some(header_value_str) = response.header(&header_name_str) {
            let header_name = HeaderName::from_bytes(header_name_str.as_bytes())
                .map_err(|err| build_header_name_error(url, &header_name_str, &err))?;
            let header_value = HeaderValue::from_bytes(header_value_str.as_bytes())
                .map_err(|err| build_header_value_error(url, header_value_str, &err))?;
            response_builder.header(header_name, header_value);
        }
    }
    response_builder.body(ResponseBody::from_reader(response.into_reader()));
    Ok(response_builder.build())
}

fn build_status_code_error(url: &Uri, code: u16, err: &dyn Display) -> ResponseError {
    ResponseError::builder_with_msg(
        ResponseErrorKind::InvalidRequestResponse,
        format!("invalid status code({}): {}", code, err),
    )
    .url(url)
    .build()
}

fn build_header_name_error(url: &Uri, header_name: &str, err: &dyn Display) -> ResponseError {
    ResponseError::builder_with_msg(
        ResponseErrorKind::InvalidHeader,
        format!("invalid header name({}): {}", header_name, err),
    )
    .url(url)
    .build()
}

fn build_header_value_error(url: &Uri, header_value: &str, err: &dyn Display) -> ResponseError {
    ResponseError::builder_with_msg(
        ResponseErrorKind::InvalidHeader,
        format!("invalid header value({}): {}", header_value, err),
    )
    .url(url)
    .build()
}

fn parse_http_version(version: &str, url: &Uri) -> Result<Version, ResponseError> {
    match version {
        "HTTP/0.9" => Ok(Version::HTTP_09),
        "HTTP/1.0" => Ok(Version::HTTP_10),
        "HTTP/1.1" => Ok(Version::HTTP_11),
        "HTTP/2.0" => Ok(Version::HTTP_2),
        "HTTP/3.0" => Ok(Version::HTTP_3),
        _ => Err(ResponseError::builder_with_msg(
            ResponseErrorKind::InvalidRequestResponse,
            format!("invalid http version: {}", version),
        )
        .url(url)
        .build()),
    }
}

fn from_transport_error(transport: ureq::Transport, url: &Uri) -> ResponseError {
    let timed_out = transport
        .source()
        .and_then(|source| source.downcast_ref::<IoError>())
        .map_or(false, |err| err.kind() == IoErrorKind::TimedOut);
    let response_error_kind = match transport.kind() {
        _ if timed_out => ResponseErrorKind::TimeoutError,
        UreqErrorKind::InvalidUrl | UreqErrorKind::UnknownScheme => ResponseErrorKind::InvalidUrl,
        UreqErrorKind::Dns => ResponseErrorKind::DnsServerError,
        UreqErrorKind::ConnectionFailed => ResponseErrorKind::ConnectError,
        UreqErrorKind::TooManyRedirects => ResponseErrorKind::TooManyRedirect,
        UreqErrorKind::BadStatus | UreqErrorKind::HTTP => ResponseErrorKind::InvalidRequestResponse,
        UreqErrorKind::BadHeader => ResponseErrorKind::InvalidHeader,
        UreqErrorKind::Io => ResponseErrorKind::SendError,
        UreqErrorKind::InvalidProxyUrl | UreqErrorKind::ProxyConnect | UreqErrorKind::ProxyUnauthorized => {
            ResponseErrorKind::ProxyError
        }
        UreqErrorKind::InsecureRequestHttpsOnly => ResponseErrorKind::SslError,
    };
    ResponseError::builder(response_error_kind, AnyError::new(transport))
        .url(url)
        .build()
}
