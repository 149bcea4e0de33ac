// src/procs/func.rs

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::dataset::{DatasetError, Record, Transformer};

/// Passes records through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

#[async_trait]
impl Transformer for Identity {
    async fn transform(
        &self,
        _cancel: &CancellationToken,
        records: Vec<Record>,
    ) -> Result<Vec<Record>, DatasetError> {
        Ok(records)
    }
}

/// Adapts a plain function over a batch into a [`Transformer`].
pub struct FnTransform<F>(F);

impl<F> FnTransform<F>
where
    F: Fn(Vec<Record>) -> Result<Vec<Record>, DatasetError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        FnTransform(f)
    }
}

#[async_trait]
impl<F> Transformer for FnTransform<F>
where
    F: Fn(Vec<Record>) -> Result<Vec<Record>, DatasetError> + Send + Sync,
{
    async fn transform(
        &self,
        _cancel: &CancellationToken,
        records: Vec<Record>,
    ) -> Result<Vec<Record>, DatasetError> {
        (self.0)(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_identity_keeps_order() {
        let records: Vec<Record> = (0..3)
            .map(|i| {
                let mut rec = Record::new();
                rec.insert("id".into(), json!(i));
                rec
            })
            .collect();

        let out = Identity
            .transform(&CancellationToken::new(), records.clone())
            .await
            .unwrap();
        assert_eq!(out, records);
    }

    #[tokio::test]
    async fn test_fn_transform_may_change_cardinality() {
        let double = FnTransform::new(|records| {
            Ok(records
                .into_iter()
                .flat_map(|rec| [rec.clone(), rec])
                .collect())
        });

        let out = double
            .transform(&CancellationToken::new(), vec![Record::new(), Record::new()])
            .await
            .unwrap();
        assert_eq!(out.len(), 4);
    }

    #[tokio::test]
    async fn test_fn_transform_error() {
        let failing = FnTransform::new(|_records| {
            Err(DatasetError::Transform("bad record".into()))
        });

        let err = failing
            .transform(&CancellationToken::new(), vec![Record::new()])
            .await
            .unwrap_err();
        assert!(matches!(err, DatasetError::Transform(_)));
    }
}
