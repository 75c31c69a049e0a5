//! Public-read bucket policy.
//!
//! Anonymous `s3:GetObject` is granted on the three category prefixes
//! only; anything else in the bucket stays private.

use serde::Serialize;

use super::path::Category;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PolicyDocument {
    version: &'static str,
    statement: Vec<Statement>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Statement {
    sid: &'static str,
    effect: &'static str,
    principal: Principal,
    action: Vec<&'static str>,
    resource: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Principal {
    #[serde(rename = "AWS")]
    aws: Vec<&'static str>,
}

/// Resource ARNs readable by anyone, e.g. `arn:aws:s3:::bucket/*/pictures/*`.
pub fn public_resources(bucket: &str) -> Vec<String> {
    Category::ALL
        .iter()
        .map(|c| format!("arn:aws:s3:::{bucket}/*/{}/*", c.segment()))
        .collect()
}

/// Render the policy JSON for `bucket`.
pub fn public_read_policy(bucket: &str) -> String {
    let doc = PolicyDocument {
        version: "2012-10-17",
        statement: vec![Statement {
            sid: "PublicRead",
            effect: "Allow",
            principal: Principal { aws: vec!["*"] },
            action: vec!["s3:GetObject"],
            resource: public_resources(bucket),
        }],
    };
    // Serializing a struct of strings cannot fail.
    serde_json::to_string(&doc).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_substitutes_bucket() {
        let policy = public_read_policy("resumes-prod");
        let value: serde_json::Value = serde_json::from_str(&policy).unwrap();

        assert_eq!(value["Version"], "2012-10-17");
        let stmt = &value["Statement"][0];
        assert_eq!(stmt["Effect"], "Allow");
        assert_eq!(stmt["Principal"]["AWS"][0], "*");
        assert_eq!(stmt["Action"][0], "s3:GetObject");

        let resources: Vec<&str> = stmt["Resource"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_str().unwrap())
            .collect();
        assert_eq!(
            resources,
            vec![
                "arn:aws:s3:::resumes-prod/*/pictures/*",
                "arn:aws:s3:::resumes-prod/*/previews/*",
                "arn:aws:s3:::resumes-prod/*/resumes/*",
            ]
        );
    }

    #[test]
    fn test_policy_only_grants_get_object() {
        let policy = public_read_policy("b");
        assert!(!policy.contains("PutObject"));
        assert!(!policy.contains("DeleteObject"));
    }
}
