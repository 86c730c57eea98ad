use super::{split_words, MapReduceApp};
use crate::kv::KeyValue;

/// WordCount: cuántas veces aparece cada palabra en todas las entradas.
pub struct WordCount;

impl MapReduceApp for WordCount {
    fn name(&self) -> &'static str {
        "wc"
    }

    fn map(&self, _input_name: &str, contents: &str) -> Vec<KeyValue> {
        split_words(contents)
            .map(|w| KeyValue::new(w, "1"))
            .collect()
    }

    fn reduce(&self, _key: &str, values: &[String]) -> String {
        values.len().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_emite_un_uno_por_palabra() {
        let out = WordCount.map("a.txt", "x y x");
        assert_eq!(
            out,
            vec![
                KeyValue::new("x", "1"),
                KeyValue::new("y", "1"),
                KeyValue::new("x", "1"),
            ]
        );
    }

    #[test]
    fn map_de_archivo_vacio_no_emite_nada() {
        assert!(WordCount.map("vacio.txt", "  \n\t ").is_empty());
    }

    #[test]
    fn reduce_cuenta_valores() {
        let vals = vec!["1".to_string(); 3];
        assert_eq!(WordCount.reduce("x", &vals), "3");
    }
}
