//! Read access to ConfigMaps, needed to mount every key of the Spark
//! ConfigMap as an individual file.

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::{Api, Client, ResourceExt};
use snafu::{OptionExt, ResultExt, Snafu};

use crate::constants::DEFAULT_NAMESPACE;

#[derive(Debug, Snafu)]
pub enum ConfigMapReadError {
    #[snafu(display("failed to get ConfigMap {name:?} in namespace {namespace:?}"))]
    GetConfigMap {
        source: kube::Error,
        namespace: String,
        name: String,
    },

    #[snafu(display("ConfigMap {name:?} in namespace {namespace:?} is not known"))]
    UnknownConfigMap { namespace: String, name: String },
}

/// Returns the data of a ConfigMap, keyed by file name.
///
/// Implementations are shared between concurrently handled admission
/// requests. Timeouts and retries are up to the implementation, the mutation
/// rules treat every error as "no data available".
#[async_trait]
pub trait ConfigMapReader: Send + Sync {
    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<BTreeMap<String, String>, ConfigMapReadError>;
}

#[async_trait]
impl ConfigMapReader for Client {
    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<BTreeMap<String, String>, ConfigMapReadError> {
        let api: Api<ConfigMap> = Api::namespaced(self.clone(), namespace);
        let config_map = api.get(name).await.with_context(|_| GetConfigMapSnafu {
            namespace,
            name,
        })?;

        Ok(config_map.data.unwrap_or_default())
    }
}

#[async_trait]
impl<R> ConfigMapReader for &R
where
    R: ConfigMapReader + ?Sized,
{
    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<BTreeMap<String, String>, ConfigMapReadError> {
        (**self).get(namespace, name).await
    }
}

/// An in-memory [`ConfigMapReader`], e.g. for offline rendering or tests.
#[derive(Clone, Debug, Default)]
pub struct StaticConfigMaps {
    /// Keyed by namespace and name.
    config_maps: BTreeMap<(String, String), BTreeMap<String, String>>,
}

impl StaticConfigMaps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a ConfigMap. ConfigMaps without a namespace are put into the
    /// [`DEFAULT_NAMESPACE`].
    pub fn insert(&mut self, config_map: ConfigMap) -> &mut Self {
        let namespace = config_map
            .namespace()
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_owned());
        let name = config_map.name_any();

        self.config_maps
            .insert((namespace, name), config_map.data.unwrap_or_default());
        self
    }

    pub fn with(mut self, config_map: ConfigMap) -> Self {
        self.insert(config_map);
        self
    }
}

impl FromIterator<ConfigMap> for StaticConfigMaps {
    fn from_iter<T: IntoIterator<Item = ConfigMap>>(iter: T) -> Self {
        let mut config_maps = Self::new();
        for config_map in iter {
            config_maps.insert(config_map);
        }
        config_maps
    }
}

#[async_trait]
impl ConfigMapReader for StaticConfigMaps {
    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<BTreeMap<String, String>, ConfigMapReadError> {
        self.config_maps
            .get(&(namespace.to_owned(), name.to_owned()))
            .cloned()
            .context(UnknownConfigMapSnafu { namespace, name })
    }
}

#[cfg(test)]
mod tests {
    use kube::api::ObjectMeta;

    use super::*;

    fn config_map(namespace: Option<&str>, name: &str) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.to_owned()),
                namespace: namespace.map(ToOwned::to_owned),
                ..Default::default()
            },
            data: Some(BTreeMap::from([(
                "spark-defaults.conf".to_owned(),
                "spark.executor.cores 2".to_owned(),
            )])),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn static_lookup() {
        let reader = StaticConfigMaps::new().with(config_map(Some("spark"), "conf"));

        let data = reader.get("spark", "conf").await.expect("ConfigMap is known");
        assert_eq!(data.keys().collect::<Vec<_>>(), ["spark-defaults.conf"]);
    }

    #[tokio::test]
    async fn static_lookup_defaults_namespace() {
        let reader: StaticConfigMaps = [config_map(None, "conf")].into_iter().collect();

        assert!(reader.get("default", "conf").await.is_ok());
        assert!(matches!(
            reader.get("other", "conf").await,
            Err(ConfigMapReadError::UnknownConfigMap { .. })
        ));
    }
}
