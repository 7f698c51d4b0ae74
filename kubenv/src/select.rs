use chrono::{DateTime, FixedOffset};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("no kube-env found")]
    NoKubeEnv,
}

#[derive(Debug, Clone)]
pub struct MetadataItem {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InstanceTemplate {
    pub name: String,
    pub creation_timestamp: String,
    pub metadata: Vec<MetadataItem>,
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub template: String,
    pub created: DateTime<FixedOffset>,
    pub kube_env: String,
}

/// Picks the kube-env of the newest template whose `cluster-name` metadata
/// matches `cluster_name`.
///
/// A candidate only replaces the incumbent when strictly more recent, so the
/// first-seen template wins among equal timestamps. Templates with an
/// unparseable creation timestamp are reported through `warn` and skipped;
/// templates for other clusters are skipped silently. A matching template
/// without a `kube-env` entry counts as carrying the empty string; selection
/// fails only when no match exists or every match degenerates to empty.
pub fn newest_kube_env(
    templates: &[InstanceTemplate],
    cluster_name: &str,
    mut warn: impl FnMut(&InstanceTemplate, chrono::ParseError),
) -> Result<Selection, SelectError> {
    let mut latest: Option<Selection> = None;
    let mut saw_kube_env = false;

    for template in templates {
        let created = match DateTime::parse_from_rfc3339(&template.creation_timestamp) {
            Ok(created) => created,
            Err(err) => {
                warn(template, err);
                continue;
            }
        };

        let mut template_cluster = None;
        let mut kube_env = None;
        for item in &template.metadata {
            match item.key.as_str() {
                "cluster-name" => template_cluster = item.value.as_deref(),
                "kube-env" => kube_env = item.value.as_deref(),
                _ => {}
            }
        }

        if template_cluster != Some(cluster_name) {
            continue;
        }

        let kube_env = kube_env.unwrap_or("");
        if !kube_env.is_empty() {
            saw_kube_env = true;
        }

        if latest.as_ref().is_some_and(|sel| created <= sel.created) {
            continue;
        }

        latest = Some(Selection {
            template: template.name.clone(),
            created,
            kube_env: kube_env.to_owned(),
        });
    }

    match latest {
        Some(selection) if saw_kube_env => Ok(selection),
        _ => Err(SelectError::NoKubeEnv),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(name: &str, created: &str, cluster: Option<&str>, env: Option<&str>) -> InstanceTemplate {
        let mut metadata = Vec::new();
        if let Some(cluster) = cluster {
            metadata.push(MetadataItem {
                key: "cluster-name".to_owned(),
                value: Some(cluster.to_owned()),
            });
        }
        metadata.push(MetadataItem {
            key: "kube-env".to_owned(),
            value: env.map(str::to_owned),
        });

        InstanceTemplate {
            name: name.to_owned(),
            creation_timestamp: created.to_owned(),
            metadata,
        }
    }

    fn no_warn(template: &InstanceTemplate, err: chrono::ParseError) {
        panic!("unexpected warning for {}: {err}", template.name);
    }

    #[test]
    fn picks_newest_regardless_of_order() {
        let t1 = template("t1", "2016-01-01T00:00:00Z", Some("prod"), Some("ONE: 1"));
        let t2 = template("t2", "2016-02-01T00:00:00Z", Some("prod"), Some("TWO: 2"));
        let t3 = template("t3", "2016-03-01T00:00:00Z", Some("prod"), Some("THREE: 3"));

        for order in [
            vec![t1.clone(), t2.clone(), t3.clone()],
            vec![t3.clone(), t1.clone(), t2.clone()],
            vec![t2.clone(), t3.clone(), t1.clone()],
        ] {
            let selection = newest_kube_env(&order, "prod", no_warn).unwrap();
            assert_eq!(selection.template, "t3");
            assert_eq!(selection.kube_env, "THREE: 3");
        }
    }

    #[test]
    fn equal_timestamps_keep_first_seen() {
        let templates = vec![
            template("first", "2016-03-01T00:00:00Z", Some("prod"), Some("A: 1")),
            template("second", "2016-03-01T00:00:00Z", Some("prod"), Some("B: 2")),
        ];

        let selection = newest_kube_env(&templates, "prod", no_warn).unwrap();
        assert_eq!(selection.template, "first");
    }

    #[test]
    fn other_clusters_are_skipped_silently() {
        let templates = vec![
            template("other", "2016-03-01T00:00:00Z", Some("staging"), Some("X: 1")),
            template("mine", "2016-01-01T00:00:00Z", Some("prod"), Some("Y: 2")),
        ];

        let selection = newest_kube_env(&templates, "prod", no_warn).unwrap();
        assert_eq!(selection.template, "mine");
    }

    #[test]
    fn no_match_fails() {
        let templates = vec![template("t", "2016-01-01T00:00:00Z", Some("staging"), Some("X: 1"))];

        let err = newest_kube_env(&templates, "prod", no_warn).unwrap_err();
        assert_eq!(err.to_string(), "no kube-env found");
    }

    #[test]
    fn bad_timestamp_warns_and_skips() {
        let templates = vec![
            template("broken", "not-a-timestamp", Some("prod"), Some("X: 1")),
            template("ok", "2016-01-01T00:00:00Z", Some("prod"), Some("Y: 2")),
        ];

        let mut warned = Vec::new();
        let selection =
            newest_kube_env(&templates, "prod", |t, _| warned.push(t.name.clone())).unwrap();

        assert_eq!(warned, ["broken"]);
        assert_eq!(selection.template, "ok");
    }

    #[test]
    fn all_matches_empty_fails() {
        let templates = vec![
            template("absent", "2016-01-01T00:00:00Z", Some("prod"), None),
            template("blank", "2016-02-01T00:00:00Z", Some("prod"), Some("")),
        ];

        let err = newest_kube_env(&templates, "prod", no_warn).unwrap_err();
        assert_eq!(err.to_string(), "no kube-env found");
    }

    #[test]
    fn empty_winner_is_kept_when_an_older_match_has_content() {
        let templates = vec![
            template("older", "2016-01-01T00:00:00Z", Some("prod"), Some("X: 1")),
            template("newest", "2016-02-01T00:00:00Z", Some("prod"), None),
        ];

        let selection = newest_kube_env(&templates, "prod", no_warn).unwrap();
        assert_eq!(selection.template, "newest");
        assert_eq!(selection.kube_env, "");
    }
}
