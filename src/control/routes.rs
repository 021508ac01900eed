//! Request routing for the control endpoint.
//!
//! | Method | Path                 | Message                  |
//! |--------|----------------------|--------------------------|
//! | POST   | `/activity/{kind}`   | `Activity`               |
//! | POST   | `/open?path=`        | `Opened`                 |
//! | POST   | `/close?path=`       | `Closed`                 |
//! | POST   | `/save?path=`        | `Saved`                  |
//! | POST   | `/resign-active`     | `ResignActive`           |
//! | POST   | `/enable?path=`      | `Enable`                 |
//! | POST   | `/disable?path=`     | `Disable`                |
//! | POST   | `/queue?path=`       | `Queue`                  |
//! | POST   | `/reinstall[?path=]` | `Reinstall` (waits)      |
//! | GET    | `/status`            | `Status` (waits)         |

use std::path::PathBuf;

use percent_encoding::percent_decode_str;
use thiserror::Error;
use tiny_http::Method;

use crate::actor::messages::InstallerMsg;
use crate::schedule::{Activity, UnknownActivity};

/// A parsed control request.
#[derive(Debug)]
pub enum Route {
    /// Fire-and-forget signal.
    Signal(InstallerMsg),
    /// Forced rebuild; the response carries the batch report.
    Reinstall(Vec<PathBuf>),
    Status,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("no such endpoint: {0}")]
    NotFound(String),

    #[error("{0} requires {1}")]
    MethodNotAllowed(String, &'static str),

    #[error("{0} requires a `path` query parameter")]
    MissingPath(String),

    #[error(transparent)]
    UnknownActivity(#[from] UnknownActivity),
}

impl RouteError {
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::MethodNotAllowed(..) => 405,
            Self::MissingPath(_) | Self::UnknownActivity(_) => 400,
        }
    }
}

pub fn parse(method: &Method, url: &str) -> Result<Route, RouteError> {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let paths = query_paths(query);
    let path = path.trim_end_matches('/');

    if path == "/status" {
        return match method {
            Method::Get => Ok(Route::Status),
            _ => Err(RouteError::MethodNotAllowed(path.to_owned(), "GET")),
        };
    }

    let known = path == "/resign-active"
        || path == "/reinstall"
        || path.starts_with("/activity/")
        || matches!(
            path,
            "/open" | "/close" | "/save" | "/enable" | "/disable" | "/queue"
        );
    if !known {
        return Err(RouteError::NotFound(path.to_owned()));
    }
    if *method != Method::Post {
        return Err(RouteError::MethodNotAllowed(path.to_owned(), "POST"));
    }

    if let Some(kind) = path.strip_prefix("/activity/") {
        let activity: Activity = decode(kind).parse()?;
        return Ok(Route::Signal(InstallerMsg::Activity(activity)));
    }

    match path {
        "/resign-active" => return Ok(Route::Signal(InstallerMsg::ResignActive)),
        "/reinstall" => return Ok(Route::Reinstall(paths)),
        _ => {}
    }

    let source = paths
        .into_iter()
        .next()
        .ok_or_else(|| RouteError::MissingPath(path.to_owned()))?;
    let msg = match path {
        "/open" => InstallerMsg::Opened(source),
        "/close" => InstallerMsg::Closed(source),
        "/save" => InstallerMsg::Saved(source),
        "/enable" => InstallerMsg::Enable(source),
        "/disable" => InstallerMsg::Disable(source),
        _ => InstallerMsg::Queue(source),
    };
    Ok(Route::Signal(msg))
}

/// Every non-empty `path=` value, in order.
fn query_paths(query: &str) -> Vec<PathBuf> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, value)| *key == "path" && !value.is_empty())
        .map(|(_, value)| PathBuf::from(decode(&value.replace('+', " "))))
        .collect()
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(url: &str) -> Result<Route, RouteError> {
        parse(&Method::Post, url)
    }

    #[test]
    fn test_activity_route() {
        match post("/activity/mouse-drag") {
            Ok(Route::Signal(InstallerMsg::Activity(a))) => assert_eq!(a, Activity::MouseDrag),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(
            post("/activity/scroll"),
            Err(RouteError::UnknownActivity(_))
        ));
    }

    #[test]
    fn test_path_is_percent_decoded() {
        match post("/save?path=%2Ffonts%2FMy%20Font-Bold.ufo") {
            Ok(Route::Signal(InstallerMsg::Saved(path))) => {
                assert_eq!(path, PathBuf::from("/fonts/My Font-Bold.ufo"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        match post("/open?path=/fonts/A+B.ufo") {
            Ok(Route::Signal(InstallerMsg::Opened(path))) => {
                assert_eq!(path, PathBuf::from("/fonts/A B.ufo"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_signal_routes_need_path() {
        for endpoint in ["/open", "/close", "/save", "/enable", "/disable", "/queue"] {
            assert_eq!(
                post(endpoint).unwrap_err(),
                RouteError::MissingPath(endpoint.to_owned())
            );
        }
        assert!(matches!(
            post("/queue?path=/fonts/Fam.designspace"),
            Ok(Route::Signal(InstallerMsg::Queue(_)))
        ));
    }

    #[test]
    fn test_reinstall_collects_paths() {
        match post("/reinstall?path=/a.ufo&path=/b.ufo&other=1") {
            Ok(Route::Reinstall(paths)) => {
                assert_eq!(paths, [PathBuf::from("/a.ufo"), PathBuf::from("/b.ufo")]);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(post("/reinstall"), Ok(Route::Reinstall(p)) if p.is_empty()));
    }

    #[test]
    fn test_methods_and_unknown_paths() {
        assert!(matches!(parse(&Method::Get, "/status"), Ok(Route::Status)));
        assert!(matches!(parse(&Method::Get, "/status/"), Ok(Route::Status)));
        assert_eq!(post("/status").unwrap_err().status(), 405);
        assert_eq!(parse(&Method::Get, "/resign-active").unwrap_err().status(), 405);
        assert_eq!(post("/install").unwrap_err().status(), 404);
        assert!(matches!(
            post("/resign-active"),
            Ok(Route::Signal(InstallerMsg::ResignActive))
        ));
    }
}
