use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{Scenario, ScenarioResult};
use crate::codec::{BodyCodec, JsonCodec};
use crate::error::ScenarioError;
use crate::host::{HostAdapter, MemoryHost};
use crate::options::ScenarioOptions;
use crate::routing::{RouteResolver, RouteTable};

/// Everything a scenario needs from its surroundings: the host adapter,
/// route resolution, the body codec and the default options.
///
/// Cheap to clone; scenarios running concurrently may share one.
#[derive(Clone)]
pub struct ScenarioHost {
    adapter: Arc<dyn HostAdapter>,
    resolver: Arc<dyn RouteResolver>,
    codec: Arc<dyn BodyCodec>,
    options: ScenarioOptions,
}

impl ScenarioHost {
    pub fn new(adapter: impl HostAdapter + 'static) -> Self {
        Self {
            adapter: Arc::new(adapter),
            resolver: Arc::new(RouteTable::new()),
            codec: Arc::new(JsonCodec),
            options: ScenarioOptions::default(),
        }
    }

    /// An in-memory host doubles as the route resolver. Pass an
    /// `Arc<MemoryHost>` to keep a handle on its history.
    pub fn for_memory(host: impl Into<Arc<MemoryHost>>) -> Self {
        let host = host.into();
        Self {
            adapter: host.clone(),
            resolver: host,
            codec: Arc::new(JsonCodec),
            options: ScenarioOptions::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: impl RouteResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn with_codec(mut self, codec: impl BodyCodec + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    pub fn with_options(mut self, options: ScenarioOptions) -> Self {
        self.options = options;
        self
    }

    pub fn adapter(&self) -> &dyn HostAdapter {
        self.adapter.as_ref()
    }

    pub fn resolver(&self) -> &dyn RouteResolver {
        self.resolver.as_ref()
    }

    pub fn codec(&self) -> &dyn BodyCodec {
        self.codec.as_ref()
    }

    pub(crate) fn codec_handle(&self) -> Arc<dyn BodyCodec> {
        Arc::clone(&self.codec)
    }

    pub fn options(&self) -> &ScenarioOptions {
        &self.options
    }

    /// Declare a scenario in `configure`, then execute it.
    pub async fn scenario<F>(&self, configure: F) -> Result<ScenarioResult, ScenarioError>
    where
        F: FnOnce(&mut Scenario),
    {
        let mut scenario = Scenario::new();
        configure(&mut scenario);
        scenario.run(self).await
    }

    /// POST `value` as JSON to `url`, expecting a 2xx response.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        value: &T,
        url: &str,
    ) -> Result<JsonResponse, ScenarioError> {
        let result = self
            .scenario(|s| {
                s.post().json(value).url(url);
                s.status_code_should_be_success();
            })
            .await?;
        Ok(JsonResponse { result })
    }

    /// GET `url`, expecting a 2xx response.
    pub async fn get_json(&self, url: &str) -> Result<JsonResponse, ScenarioError> {
        let result = self
            .scenario(|s| {
                s.get().url(url).accepts(self.codec.content_type());
                s.status_code_should_be_success();
            })
            .await?;
        Ok(JsonResponse { result })
    }
}

/// Response of a JSON shortcut, ready to be decoded.
#[derive(Debug)]
pub struct JsonResponse {
    result: ScenarioResult,
}

impl JsonResponse {
    pub fn receive<T: DeserializeOwned>(&self) -> Result<T, ScenarioError> {
        Ok(self.result.read_as_json()?)
    }

    pub fn result(&self) -> &ScenarioResult {
        &self.result
    }

    pub fn into_result(self) -> ScenarioResult {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RouteContext;
    use crate::http::HttpMethod;

    fn host() -> ScenarioHost {
        ScenarioHost::for_memory(
            MemoryHost::builder()
                .action("get_memory_hello", HttpMethod::Get, "/memory/hello", |_: &RouteContext<'_>| {
                    "hello from the in memory host"
                })
                .build(),
        )
    }

    #[test]
    fn memory_host_resolves_its_own_actions() {
        let host = host();
        let template = host.resolver().resolve_action("get_memory_hello").unwrap();
        assert_eq!(template.as_str(), "/memory/hello");
        assert_eq!(host.codec().content_type(), "application/json");
        assert_eq!(host.options(), &ScenarioOptions::default());
    }

    #[tokio::test]
    async fn clones_share_the_adapter() {
        let host = host();
        let copy = host.clone();

        copy.scenario(|s| {
            s.get().action("get_memory_hello");
        })
        .await
        .unwrap();

        let result = host
            .scenario(|s| {
                s.get().url("/memory/hello");
                s.content_should_be("hello from the in memory host");
            })
            .await
            .unwrap();
        assert_eq!(result.report().passed, 1);
    }

    #[tokio::test]
    async fn get_json_declares_accept() {
        let result = host().get_json("/memory/hello").await.unwrap();
        assert_eq!(
            result.result().request().headers().get("Accept"),
            Some("application/json")
        );
        assert!(result.receive::<String>().is_err());
    }
}
