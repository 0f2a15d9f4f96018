use super::{unmarshal::ResponseUnmarshaller, Error, Result};
use cookie::Cookie;
use indexmap::IndexMap;
use log::{debug, warn};
use reqkit_http::{
    header::{AUTHORIZATION, CONTENT_TYPE, COOKIE},
    HeaderName, HeaderValue, HttpCaller, Method, Request as HttpRequest, RequestBody, Response, ResponseError,
    ResponseErrorKind, Uri,
};

pub(super) struct Dispatch<'a> {
    pub(super) method: Method,
    pub(super) url: String,
    pub(super) headers: &'a IndexMap<String, String>,
    pub(super) body: Option<(RequestBody, String)>,
    pub(super) basic_auth: Option<&'a (String, String)>,
    pub(super) cookies: &'a [Cookie<'static>],
}

pub(super) fn execute(
    http_caller: &dyn HttpCaller,
    dispatch: Dispatch<'_>,
    unmarshallers: &mut [Box<dyn ResponseUnmarshaller + Send + '_>],
) -> Result<Response> {
    let url = dispatch.url.parse::<Uri>().map_err(|source| Error::InvalidUrl {
        url: dispatch.url.to_owned(),
        source,
    })?;
    let request = make_request(&url, dispatch)?;

    debug!("dispatching {} {}", request.method(), url);
    let response = http_caller.call(request).map_err(|err| {
        warn!("transport failed to call {}: {}", url, err);
        Error::Transport(err)
    })?;
    unmarshal_response(response, Some(&url), unmarshallers)
}

/// 将响应体交给所有解析器，返回最后一个解析错误
pub(super) fn unmarshal_response(
    mut response: Response,
    url: Option<&Uri>,
    unmarshallers: &mut [Box<dyn ResponseUnmarshaller + Send + '_>],
) -> Result<Response> {
    if unmarshallers.is_empty() {
        return Ok(response);
    }

    let body = response.fulfill_body().map_err(|err| {
        let mut builder = ResponseError::builder(ResponseErrorKind::ReceiveError, err);
        if let Some(url) = url {
            builder = builder.url(url);
        }
        Error::Transport(builder.build())
    })?;
    let mut last_error = None;
    for unmarshaller in unmarshallers.iter_mut() {
        if let Err(err) = unmarshaller.unmarshal(body) {
            last_error = Some(err);
        }
    }
    match last_error {
        Some(error) => {
            match url {
                Some(url) => warn!("failed to unmarshal response body from {}: {}", url, error),
                None => warn!("failed to unmarshal response body: {}", error),
            }
            Err(Error::Unmarshal {
                response: Box::new(response),
                error,
            })
        }
        None => Ok(response),
    }
}

fn make_request(url: &Uri, dispatch: Dispatch<'_>) -> Result<HttpRequest> {
    let mut builder = HttpRequest::builder();
    builder.method(dispatch.method).url(url.to_owned());
    for (name, value) in dispatch.headers {
        builder.header(header_name(name)?, header_value(name, value)?);
    }
    if let Some((body, content_type)) = dispatch.body {
        builder
            .header(CONTENT_TYPE, header_value(CONTENT_TYPE.as_str(), &content_type)?)
            .body(body);
    }
    if let Some((user, password)) = dispatch
        .basic_auth
        .filter(|(user, password)| !user.is_empty() || !password.is_empty())
    {
        let credential = format!("Basic {}", base64::encode(format!("{}:{}", user, password)));
        builder.header(AUTHORIZATION, header_value(AUTHORIZATION.as_str(), &credential)?);
    }
    if !dispatch.cookies.is_empty() {
        let cookies = dispatch
            .cookies
            .iter()
            .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
            .collect::<Vec<_>>()
            .join("; ");
        builder.header(COOKIE, header_value(COOKIE.as_str(), &cookies)?);
    }
    Ok(builder.build())
}

fn header_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|err| Error::InvalidHeader {
        name: name.to_owned(),
        message: err.to_string(),
    })
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|err| Error::InvalidHeader {
        name: name.to_owned(),
        message: err.to_string(),
    })
}
