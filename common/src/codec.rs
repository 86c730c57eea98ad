use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use crate::kv::KeyValue;

/// Escribe los registros como JSONL: un objeto `{"key":..,"value":..}` por línea.
pub fn write_records<W: Write>(writer: &mut W, records: &[KeyValue]) -> io::Result<()> {
    for kv in records {
        serde_json::to_writer(&mut *writer, kv)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Lee todos los registros JSONL de un reader. Las líneas vacías se saltan;
/// una línea mal formada invalida todo el archivo.
pub fn read_records<R: BufRead>(reader: R) -> io::Result<Vec<KeyValue>> {
    let mut out = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let kv: KeyValue = serde_json::from_str(&line).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("registro inválido en la línea {}: {e}", n + 1),
            )
        })?;
        out.push(kv);
    }
    Ok(out)
}

pub fn write_records_to_file(path: &Path, records: &[KeyValue]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_records(&mut writer, records)?;
    writer.flush()
}

pub fn read_records_from_file(path: &Path) -> io::Result<Vec<KeyValue>> {
    let file = File::open(path)?;
    read_records(BufReader::new(file))
}
