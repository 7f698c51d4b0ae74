use std::fmt;

use serde::*;

use crate::env::KubeEnv;

// region: Common
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub enum ApiVersion {
    #[serde(rename = "v1")]
    V1,
}
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub enum Kind {
    Config,
}
// endregion

// region: User
#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct UserSpec {
    pub client_certificate_data: String,
    pub client_key_data: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct User {
    pub name: String,
    pub user: UserSpec,
}
// endregion

// region: Cluster
#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ClusterSpec {
    pub certificate_authority_data: String,
    pub server: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Cluster {
    pub name: String,
    pub cluster: ClusterSpec,
}
// endregion

// region: Context
#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ContextSpec {
    pub cluster: String,
    pub user: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Context {
    pub context: ContextSpec,
    pub name: String,
}
// endregion

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct KubeConfig {
    #[serde(rename = "apiVersion")]
    pub api_version: ApiVersion,
    pub kind: Kind,
    pub users: Vec<User>,
    pub clusters: Vec<Cluster>,
    pub contexts: Vec<Context>,
    pub current_context: String,
}

impl KubeConfig {
    /// Builds the single-user, single-cluster config a kubelet needs from
    /// the four well-known kube-env fields. Fields missing from the blob
    /// substitute as empty strings.
    pub fn from_kube_env(env: &KubeEnv) -> KubeConfig {
        KubeConfig {
            api_version: ApiVersion::V1,
            kind: Kind::Config,
            users: vec![User {
                name: "kubelet".to_owned(),
                user: UserSpec {
                    client_certificate_data: env.get("KUBELET_CERT").to_owned(),
                    client_key_data: env.get("KUBELET_KEY").to_owned(),
                },
            }],
            clusters: vec![Cluster {
                name: "local".to_owned(),
                cluster: ClusterSpec {
                    certificate_authority_data: env.get("CA_CERT").to_owned(),
                    server: format!("https://{}", env.get("KUBERNETES_MASTER_NAME")),
                },
            }],
            contexts: vec![Context {
                context: ContextSpec {
                    cluster: "local".to_owned(),
                    user: "kubelet".to_owned(),
                },
                name: "service-account-context".to_owned(),
            }],
            current_context: "service-account-context".to_owned(),
        }
    }
}

// The on-disk document shape is pinned, down to field order and raw
// unquoted values, so emission is hand-rolled rather than going through
// serde_yaml (which would reflow and quote).
impl fmt::Display for KubeConfig {
    fn fmt(&self, w: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(w, "apiVersion: v1")?;
        writeln!(w, "kind: Config")?;

        writeln!(w, "users:")?;
        for user in &self.users {
            writeln!(w, "- name: {}", user.name)?;
            writeln!(w, "  user:")?;
            writeln!(w, "    client-certificate-data: {}", user.user.client_certificate_data)?;
            writeln!(w, "    client-key-data: {}", user.user.client_key_data)?;
        }

        writeln!(w, "clusters:")?;
        for cluster in &self.clusters {
            writeln!(w, "- name: {}", cluster.name)?;
            writeln!(w, "  cluster:")?;
            writeln!(w, "    certificate-authority-data: {}", cluster.cluster.certificate_authority_data)?;
            writeln!(w, "    server: {}", cluster.cluster.server)?;
        }

        writeln!(w, "contexts:")?;
        for context in &self.contexts {
            writeln!(w, "- context:")?;
            writeln!(w, "    cluster: {}", context.context.cluster)?;
            writeln!(w, "    user: {}", context.context.user)?;
            writeln!(w, "  name: {}", context.name)?;
        }

        writeln!(w, "current-context: {}", self.current_context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(blob: &str) -> KubeEnv {
        KubeEnv::parse(blob).unwrap()
    }

    #[test]
    fn renders_the_fixed_document() {
        let config = KubeConfig::from_kube_env(&env(
            "KUBELET_CERT: AAA\nKUBELET_KEY: BBB\nCA_CERT: CCC\nKUBERNETES_MASTER_NAME: 1.2.3.4\n",
        ));

        assert_eq!(
            config.to_string(),
            "\
apiVersion: v1
kind: Config
users:
- name: kubelet
  user:
    client-certificate-data: AAA
    client-key-data: BBB
clusters:
- name: local
  cluster:
    certificate-authority-data: CCC
    server: https://1.2.3.4
contexts:
- context:
    cluster: local
    user: kubelet
  name: service-account-context
current-context: service-account-context
"
        );
    }

    #[test]
    fn missing_fields_substitute_as_empty() {
        let config = KubeConfig::from_kube_env(&env("KUBELET_CERT: AAA\n"));
        let rendered = config.to_string();

        assert!(rendered.contains("client-certificate-data: AAA\n"));
        assert!(rendered.contains("client-key-data: \n"));
        assert!(rendered.contains("certificate-authority-data: \n"));
        assert!(rendered.contains("server: https://\n"));
    }

    #[test]
    fn rendered_document_is_valid_yaml() {
        let config = KubeConfig::from_kube_env(&env(
            "KUBELET_CERT: AAA\nKUBELET_KEY: BBB\nCA_CERT: CCC\nKUBERNETES_MASTER_NAME: 1.2.3.4\n",
        ));

        let reparsed: KubeConfig = serde_yaml::from_str(&config.to_string()).unwrap();
        assert_eq!(reparsed, config);
    }
}
