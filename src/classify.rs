//! Content-type classification with an all-or-nothing batch rule.

use crate::config::ClientConfig;
use crate::model::attachment::Attachment;

/// Attachments split by whether the client accepts their content type.
/// Order within each side follows extraction order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub accepted: Vec<Attachment>,
    pub rejected: Vec<Attachment>,
}

/// A batch in which every attachment was accepted. Only [`Classification::approve`]
/// builds one, so storage can never see a partially accepted batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovedBatch(Vec<Attachment>);

impl ApprovedBatch {
    pub fn attachments(&self) -> &[Attachment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Classification {
    /// `Ok` with the whole batch when nothing was rejected, otherwise the
    /// rejected attachments.
    pub fn approve(self) -> Result<ApprovedBatch, Vec<Attachment>> {
        if self.rejected.is_empty() {
            Ok(ApprovedBatch(self.accepted))
        } else {
            Err(self.rejected)
        }
    }
}

/// Partition `attachments` by membership of their content type in the
/// client's allowed set.
pub fn classify(attachments: Vec<Attachment>, client: &ClientConfig) -> Classification {
    let (accepted, rejected) = attachments
        .into_iter()
        .partition(|a| client.allowed_content_types.contains(&a.content_type));
    Classification { accepted, rejected }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(types: &[&str]) -> ClientConfig {
        ClientConfig {
            allowed_content_types: types.iter().map(|t| t.to_string()).collect(),
            storage_prefix: "client1".to_string(),
        }
    }

    #[test]
    fn test_all_accepted_is_approved() {
        let batch = vec![
            Attachment::new("text/plain", "a.txt", "YQ=="),
            Attachment::new("image/jpeg", "b.jpg", "Yg=="),
        ];
        let approved = classify(batch, &client(&["text/plain", "image/jpeg"]))
            .approve()
            .unwrap();
        assert_eq!(approved.len(), 2);
        assert_eq!(approved.attachments()[0].file_name, "a.txt");
    }

    #[test]
    fn test_one_rejection_withholds_batch() {
        let batch = vec![
            Attachment::new("text/plain", "a.txt", "YQ=="),
            Attachment::new("application/zip", "b.zip", "Yg=="),
            Attachment::new("text/plain", "c.txt", "Yw=="),
        ];
        let classification = classify(batch, &client(&["text/plain"]));
        assert_eq!(
            classification
                .accepted
                .iter()
                .map(|a| a.file_name.as_str())
                .collect::<Vec<_>>(),
            vec!["a.txt", "c.txt"]
        );
        let rejected = classification.approve().unwrap_err();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].file_name, "b.zip");
    }

    #[test]
    fn test_match_is_exact_string() {
        let batch = vec![Attachment::new("text/plain", "a.txt", "")];
        let classification = classify(batch, &client(&[".txt"]));
        assert!(classification.accepted.is_empty());
        assert_eq!(classification.rejected.len(), 1);
    }
}
