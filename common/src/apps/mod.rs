//! Aplicaciones map/reduce que vienen con el sistema.
//!
//! El coordinator no sabe nada de ellas; el worker elige una por nombre
//! (`--app wc`) y el engine solo ve el trait.

mod indexer;
mod wordcount;

use std::sync::Arc;

use anyhow::{bail, Result};

use crate::kv::KeyValue;

pub use indexer::Indexer;
pub use wordcount::WordCount;

/// Par de funciones puras map/reduce sobre texto.
pub trait MapReduceApp: Send + Sync {
    fn name(&self) -> &'static str;

    /// (nombre de la entrada, contenido completo) -> registros clave/valor
    fn map(&self, input_name: &str, contents: &str) -> Vec<KeyValue>;

    /// (clave, valores en orden) -> una línea de salida
    fn reduce(&self, key: &str, values: &[String]) -> String;
}

pub fn app_by_name(name: &str) -> Result<Arc<dyn MapReduceApp>> {
    match name {
        "wc" | "wordcount" => Ok(Arc::new(WordCount)),
        "indexer" => Ok(Arc::new(Indexer)),
        other => bail!("aplicación desconocida: {other} (disponibles: wc, indexer)"),
    }
}

/// Palabras = tramos maximales de caracteres alfabéticos.
pub(crate) fn split_words(contents: &str) -> impl Iterator<Item = &str> {
    contents
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
}
