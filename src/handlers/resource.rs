//! Protected resource update.

use async_trait::async_trait;
use axum::http::{HeaderValue, header};

use crate::intercept::{InterceptWriter, Request, ResourceHandler};

/// Updates the caller's resource and tags the new version.
///
/// Only reachable once every authorizer on its pipeline has allowed the
/// request.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateResource;

#[async_trait]
impl ResourceHandler for UpdateResource {
    async fn call(&self, writer: &mut InterceptWriter<'_>, _request: &Request) {
        writer.add_header(header::ETAG, HeaderValue::from_static("a1"));
        writer.write("updated successfully");
    }
}
