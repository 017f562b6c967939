use crate::assets::{Assets, BadgeColor};
use crate::errors::{RelayError, Result};
use crate::page::{PageContext, TemplateError};
use crate::query::Query;
use crate::resolver::ResolvedRequest;
use http_body_util::combinators::BoxBody;
use hyper::body::Bytes;
use hyper::header::{CONTENT_TYPE, HeaderValue, LOCATION};
use hyper::{Response, StatusCode};
use shared::http::{full_body, make_error_response};
use url::Url;

pub type BeaconBody = BoxBody<Bytes, RelayError>;

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Which response a beacon request gets. The first matching rule wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No account: send the visitor to the project page
    Redirect,
    /// Account without a page: render the info page
    InfoPage,
    /// Account and page: track the hit and return an image
    Image(ImageKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Pixel,
    Badge(BadgeColor),
}

impl Decision {
    pub fn select(resolved: &ResolvedRequest) -> Self {
        if resolved.account.is_empty() {
            Decision::Redirect
        } else if resolved.page.is_none() {
            Decision::InfoPage
        } else {
            Decision::Image(ImageKind::from_query(&resolved.query))
        }
    }

    /// Label used to tag request metrics
    pub fn branch(&self) -> &'static str {
        match self {
            Decision::Redirect => "redirect",
            Decision::InfoPage => "page",
            Decision::Image(ImageKind::Pixel) => "pixel",
            Decision::Image(ImageKind::Badge(_)) => "badge",
        }
    }
}

impl ImageKind {
    /// `type=pixel` selects the transparent GIF, anything else a badge in the
    /// requested color.
    pub fn from_query(query: &Query) -> Self {
        match query.get("type") {
            Some("pixel") => ImageKind::Pixel,
            _ => ImageKind::Badge(BadgeColor::from_query(query.get("color"))),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageKind::Pixel => "image/gif",
            ImageKind::Badge(_) => "image/svg+xml",
        }
    }
}

pub fn redirect(location: &Url) -> Result<Response<BeaconBody>> {
    let location = HeaderValue::from_str(location.as_str())
        .map_err(|e| RelayError::InternalError(format!("Invalid redirect location: {e}")))?;

    let mut response = Response::new(full_body(Bytes::new()));
    *response.status_mut() = StatusCode::FOUND;
    response.headers_mut().insert(LOCATION, location);
    Ok(response)
}

pub fn info_page(assets: &Assets, account: &str, referer: &str) -> Response<BeaconBody> {
    page_response(assets.page().render(&PageContext { account, referer }))
}

fn page_response(rendered: Result<String, TemplateError>) -> Response<BeaconBody> {
    match rendered {
        Ok(page) => {
            let mut response = Response::new(full_body(page));
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
            response
        }
        Err(e) => {
            tracing::error!(error = %e, "Could not show account page");
            make_error_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Image body with its content type. Identity headers are added by the caller.
pub fn image(assets: &Assets, kind: ImageKind) -> Response<BeaconBody> {
    let body = match kind {
        ImageKind::Pixel => assets.pixel(),
        ImageKind::Badge(color) => assets.badge(color),
    };

    let mut response = Response::new(full_body(body));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(kind.content_type()));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve;
    use crate::testutils::{TEST_PIXEL, test_assets, test_badge};
    use http_body_util::BodyExt;
    use std::fmt;

    async fn body_bytes(response: Response<BeaconBody>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[test]
    fn test_select() {
        let decide = |path: &str, query: Option<&str>| Decision::select(&resolve(path, query, None));

        assert_eq!(decide("/", None), Decision::Redirect);
        assert_eq!(decide("", Some("type=pixel")), Decision::Redirect);
        assert_eq!(decide("/UA-1", None), Decision::InfoPage);
        assert_eq!(decide("/UA-1/", Some("type=pixel")), Decision::InfoPage);
        assert_eq!(
            decide("/UA-1/page", Some("type=pixel")),
            Decision::Image(ImageKind::Pixel)
        );
        assert_eq!(
            decide("/UA-1/page", Some("color=red")),
            Decision::Image(ImageKind::Badge(BadgeColor::Red))
        );
        assert_eq!(
            decide("/UA-1/page", Some("type=gif&color=nope")),
            Decision::Image(ImageKind::Badge(BadgeColor::Default))
        );
    }

    #[test]
    fn test_branch_labels() {
        assert_eq!(Decision::Redirect.branch(), "redirect");
        assert_eq!(Decision::InfoPage.branch(), "page");
        assert_eq!(Decision::Image(ImageKind::Pixel).branch(), "pixel");
        assert_eq!(
            Decision::Image(ImageKind::Badge(BadgeColor::Blue)).branch(),
            "badge"
        );
    }

    #[tokio::test]
    async fn test_redirect() {
        let url = Url::parse("https://example.com/project").unwrap();
        let response = redirect(&url).unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "https://example.com/project"
        );
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_info_page() {
        let response = info_page(&test_assets(), "UA-1234-5", "https://blog.example/<x>");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            HTML_CONTENT_TYPE
        );
        assert_eq!(
            body_bytes(response).await.as_ref(),
            b"<h1>UA-1234-5</h1><p>https://blog.example/&lt;x&gt;</p>"
        );
    }

    #[tokio::test]
    async fn test_render_failure_is_500() {
        let response = page_response(Err(TemplateError::Render(fmt::Error)));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        assert_eq!(
            body_bytes(response).await.as_ref(),
            b"Internal Server Error"
        );
    }

    #[tokio::test]
    async fn test_image() {
        let assets = test_assets();

        let response = image(&assets, ImageKind::Pixel);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "image/gif");
        assert_eq!(body_bytes(response).await.as_ref(), TEST_PIXEL);

        for color in BadgeColor::ALL {
            let response = image(&assets, ImageKind::Badge(color));
            assert_eq!(
                response.headers().get(CONTENT_TYPE).unwrap(),
                "image/svg+xml"
            );
            assert_eq!(body_bytes(response).await, test_badge(color));
        }
    }
}
