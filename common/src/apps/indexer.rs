use std::collections::BTreeSet;

use super::{split_words, MapReduceApp};
use crate::kv::KeyValue;

/// Índice invertido: para cada palabra, en qué documentos aparece.
pub struct Indexer;

impl MapReduceApp for Indexer {
    fn name(&self) -> &'static str {
        "indexer"
    }

    fn map(&self, input_name: &str, contents: &str) -> Vec<KeyValue> {
        // una sola vez por palabra y documento
        let words: BTreeSet<&str> = split_words(contents).collect();
        words
            .into_iter()
            .map(|w| KeyValue::new(w, input_name))
            .collect()
    }

    /// "<n> doc1,doc2,..." con los documentos ordenados y sin repetir.
    fn reduce(&self, _key: &str, values: &[String]) -> String {
        let docs: BTreeSet<&str> = values.iter().map(String::as_str).collect();
        let joined = docs.iter().copied().collect::<Vec<_>>().join(",");
        format!("{} {}", docs.len(), joined)
    }
}
