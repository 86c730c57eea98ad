use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use tempfile::Builder;
use tracing::{debug, warn};

use crate::apps::MapReduceApp;
use crate::codec::{read_records_from_file, write_records_to_file};
use crate::kv::KeyValue;
use crate::partition::partition_for;
use crate::task::AssignmentId;

/// Colección en memoria de registros.
pub type Records = Vec<KeyValue>;

/// Nombre del archivo intermedio de una asignación map para una partición.
/// Es único por asignación, así el writer viejo y el nuevo de una tarea
/// reasignada nunca pisan el mismo archivo.
pub fn intermediate_name(assignment: AssignmentId, bucket: u32) -> String {
    format!("mr-{}-{}", assignment, bucket)
}

/// Nombre canónico de la salida final de una partición.
pub fn output_name(partition: u32) -> String {
    format!("mr-out-{}", partition)
}

fn ensure_dir(dir: &Path) -> io::Result<()> {
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/* =========================
   Map
   ========================= */

/// Reparte registros en `n_reduce` buckets según `partition_for(key)`.
/// Dentro de cada bucket se respeta el orden de entrada.
pub fn shuffle_to_buckets(records: Records, n_reduce: u32) -> Vec<Records> {
    let mut buckets: Vec<Records> = (0..n_reduce).map(|_| Vec::new()).collect();
    for kv in records {
        let b = partition_for(&kv.key, n_reduce) as usize;
        buckets[b].push(kv);
    }
    buckets
}

/// Ejecuta una tarea map completa:
///   1. lee la entrada entera
///   2. aplica `app.map`
///   3. shuffle a `n_reduce` buckets
///   4. escribe `work_dir/mr-<assignment>-<bucket>` para cada bucket (aunque esté vacío)
///
/// Devuelve las rutas producidas, indexadas por bucket.
pub fn execute_map_task(
    app: &dyn MapReduceApp,
    input_path: &str,
    assignment: AssignmentId,
    n_reduce: u32,
    work_dir: &Path,
) -> io::Result<Vec<String>> {
    if n_reduce == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "n_reduce tiene que ser mayor que 0",
        ));
    }

    let bytes = fs::read(input_path).map_err(|e| {
        io::Error::new(e.kind(), format!("no se pudo leer {}: {e}", input_path))
    })?;
    // bytes que no son UTF-8 se reemplazan, no hacen fallar el map
    let contents = String::from_utf8_lossy(&bytes);

    let records = app.map(input_path, &contents);
    debug!(
        "map {} (asignación {}): {} registros",
        input_path,
        assignment,
        records.len()
    );

    ensure_dir(work_dir)?;

    let mut produced = Vec::with_capacity(n_reduce as usize);
    for (bucket, recs) in shuffle_to_buckets(records, n_reduce).into_iter().enumerate() {
        let path = work_dir.join(intermediate_name(assignment, bucket as u32));
        write_records_to_file(&path, &recs)?;
        produced.push(path.to_string_lossy().to_string());
    }

    Ok(produced)
}

/* =========================
   Reduce
   ========================= */

/// Concatena los registros de todos los intermedios, en orden.
/// Un archivo que no se puede abrir o está corrupto se omite con un warning.
pub fn read_intermediates<S: AsRef<str>>(files: &[S]) -> Records {
    let mut out = Vec::new();
    for f in files {
        let f = f.as_ref();
        match read_records_from_file(Path::new(f)) {
            Ok(mut recs) => out.append(&mut recs),
            Err(e) => warn!("no se pudo leer el intermedio {}: {}, se omite", f, e),
        }
    }
    out
}

/// Ordena por clave (orden estable) y agrupa cada tramo de claves iguales.
/// Los valores de una clave quedan en el mismo orden relativo que en la entrada.
pub fn group_by_key(mut records: Records) -> Vec<(String, Vec<String>)> {
    records.sort_by(|a, b| a.key.cmp(&b.key));

    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for kv in records {
        match groups.last_mut() {
            Some((key, values)) if *key == kv.key => values.push(kv.value),
            _ => groups.push((kv.key, vec![kv.value])),
        }
    }
    groups
}

/// Ejecuta una tarea reduce completa y publica `output_dir/mr-out-<partition>`.
///
/// La salida se escribe en un temporal dentro de `output_dir` y se renombra
/// al final, así nadie ve nunca un `mr-out-*` a medio escribir.
pub fn execute_reduce_task<S: AsRef<str>>(
    app: &dyn MapReduceApp,
    partition: u32,
    intermediates: &[S],
    output_dir: &Path,
) -> io::Result<PathBuf> {
    let records = read_intermediates(intermediates);

    ensure_dir(output_dir)?;
    let dir = if output_dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        output_dir
    };

    let final_path = dir.join(output_name(partition));
    let tmp = Builder::new()
        .prefix(&format!("{}-", output_name(partition)))
        .tempfile_in(dir)?;

    let keys = {
        let mut writer = BufWriter::new(tmp.as_file());
        let keys = reduce_records_to_writer(app, records, &mut writer)?;
        writer.flush()?;
        keys
    };
    tmp.as_file().sync_all()?;

    tmp.persist(&final_path)?;
    debug!(
        "reduce {}: {} claves -> {}",
        partition,
        keys,
        final_path.display()
    );

    Ok(final_path)
}

/// Agrupa por clave y escribe una línea "<clave> <resultado>" por clave.
/// Devuelve cuántas claves distintas se redujeron.
pub fn reduce_records_to_writer<W: Write>(
    app: &dyn MapReduceApp,
    records: Records,
    writer: &mut W,
) -> io::Result<usize> {
    let groups = group_by_key(records);
    for (key, values) in &groups {
        writeln!(writer, "{} {}", key, app.reduce(key, values))?;
    }
    Ok(groups.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::{Indexer, WordCount};
    use std::collections::HashMap;

    fn write_input(dir: &Path, name: &str, contents: &str) -> String {
        let p = dir.join(name);
        fs::write(&p, contents).unwrap();
        p.to_string_lossy().to_string()
    }

    fn output_lines(path: &Path) -> Vec<String> {
        let mut lines: Vec<String> = fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(String::from)
            .collect();
        lines.sort(); // el orden entre claves no importa
        lines
    }

    #[test]
    fn shuffle_manda_cada_clave_a_su_particion() {
        let recs = vec![
            KeyValue::new("x", "1"),
            KeyValue::new("y", "1"),
            KeyValue::new("x", "2"),
        ];
        let buckets = shuffle_to_buckets(recs, 3);
        assert_eq!(buckets.len(), 3);

        for (i, b) in buckets.iter().enumerate() {
            for kv in b {
                assert_eq!(partition_for(&kv.key, 3) as usize, i);
            }
        }
        let x_bucket = &buckets[partition_for("x", 3) as usize];
        let xs: Vec<&str> = x_bucket
            .iter()
            .filter(|kv| kv.key == "x")
            .map(|kv| kv.value.as_str())
            .collect();
        assert_eq!(xs, vec!["1", "2"]);
    }

    #[test]
    fn group_by_key_agrupa_sin_reordenar_valores() {
        let recs = vec![
            KeyValue::new("b", "1"),
            KeyValue::new("a", "primero"),
            KeyValue::new("b", "2"),
            KeyValue::new("a", "segundo"),
        ];
        let groups = group_by_key(recs);
        assert_eq!(
            groups,
            vec![
                ("a".to_string(), vec!["primero".to_string(), "segundo".to_string()]),
                ("b".to_string(), vec!["1".to_string(), "2".to_string()]),
            ]
        );
    }

    #[test]
    fn execute_map_task_escribe_un_archivo_por_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "a.txt", "x y x");
        let work = dir.path().join("work");

        let files = execute_map_task(&WordCount, &input, 5, 4, &work).unwrap();

        assert_eq!(files.len(), 4);
        let mut total = 0;
        for (i, f) in files.iter().enumerate() {
            assert!(f.ends_with(&intermediate_name(5, i as u32)));
            let recs = read_records_from_file(Path::new(f)).unwrap();
            for kv in &recs {
                assert_eq!(partition_for(&kv.key, 4) as usize, i);
            }
            total += recs.len();
        }
        assert_eq!(total, 3);
    }

    #[test]
    fn execute_map_task_falla_si_falta_la_entrada() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no_existe.txt");

        let res = execute_map_task(
            &WordCount,
            missing.to_str().unwrap(),
            1,
            2,
            dir.path(),
        );

        assert!(res.is_err());
        assert!(!dir.path().join(intermediate_name(1, 0)).exists());
    }

    #[test]
    fn execute_map_task_acepta_entrada_que_no_es_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("latin1.txt");
        fs::write(&input, b"caf\xe9 hola caf\xe9").unwrap();

        let files = execute_map_task(&WordCount, input.to_str().unwrap(), 1, 1, dir.path()).unwrap();

        assert_eq!(files.len(), 1);
        let recs = read_records_from_file(Path::new(&files[0])).unwrap();
        let count = |k: &str| recs.iter().filter(|kv| kv.key == k).count();
        assert_eq!(count("hola"), 1);
        assert_eq!(count("caf"), 2);
    }

    #[test]
    fn execute_map_task_rechaza_n_reduce_cero() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "a.txt", "x");
        let err = execute_map_task(&WordCount, &input, 1, 0, dir.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn reduce_de_una_particion_cuenta_palabras() {
        // escenario: nReduce=1, "hello world hello"
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "in.txt", "hello world hello");

        let files = execute_map_task(&WordCount, &input, 1, 1, dir.path()).unwrap();
        let out = execute_reduce_task(&WordCount, 0, &files, dir.path()).unwrap();

        assert_eq!(out, dir.path().join("mr-out-0"));
        assert_eq!(output_lines(&out), vec!["hello 2", "world 1"]);
    }

    #[test]
    fn reduce_junta_varios_intermedios_y_cada_valor_aparece_una_vez() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_input(dir.path(), "a.txt", "x y x");
        let b = write_input(dir.path(), "b.txt", "y z");

        let fa = execute_map_task(&WordCount, &a, 1, 2, dir.path()).unwrap();
        let fb = execute_map_task(&WordCount, &b, 2, 2, dir.path()).unwrap();

        let mut counts: HashMap<String, String> = HashMap::new();
        for p in 0..2u32 {
            let files = vec![fa[p as usize].clone(), fb[p as usize].clone()];
            let out = execute_reduce_task(&WordCount, p, &files, dir.path()).unwrap();
            for line in output_lines(&out) {
                let (k, v) = line.split_once(' ').unwrap();
                assert_eq!(partition_for(k, 2), p);
                assert!(counts.insert(k.to_string(), v.to_string()).is_none());
            }
        }

        assert_eq!(counts.len(), 3);
        assert_eq!(counts["x"], "2");
        assert_eq!(counts["y"], "2");
        assert_eq!(counts["z"], "1");
    }

    #[test]
    fn reduce_omite_intermedios_ilegibles() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("mr-1-0");
        write_records_to_file(&good, &[KeyValue::new("a", "1")]).unwrap();
        let corrupt = dir.path().join("mr-2-0");
        fs::write(&corrupt, "esto no es json\n").unwrap();
        let missing = dir.path().join("mr-3-0");

        let files = vec![
            good.to_string_lossy().to_string(),
            corrupt.to_string_lossy().to_string(),
            missing.to_string_lossy().to_string(),
        ];
        let out = execute_reduce_task(&WordCount, 0, &files, dir.path()).unwrap();

        assert_eq!(output_lines(&out), vec!["a 1"]);
    }

    #[test]
    fn reduce_sin_intermedios_publica_archivo_vacio() {
        let dir = tempfile::tempdir().unwrap();
        let files: Vec<String> = Vec::new();
        let out = execute_reduce_task(&WordCount, 3, &files, dir.path()).unwrap();

        assert!(out.exists());
        assert!(fs::read_to_string(&out).unwrap().is_empty());
    }

    #[test]
    fn reduce_reemplaza_salida_anterior_y_no_deja_temporales() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join(output_name(0));
        fs::write(&final_path, "vieja salida\n").unwrap();

        let f = dir.path().join("mr-9-0");
        write_records_to_file(&f, &[KeyValue::new("k", "doc.txt")]).unwrap();
        let files = vec![f.to_string_lossy().to_string()];

        execute_reduce_task(&Indexer, 0, &files, dir.path()).unwrap();

        assert_eq!(output_lines(&final_path), vec!["k 1 doc.txt"]);
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .filter(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                name.starts_with("mr-out-0-")
            })
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn reduce_records_to_writer_escribe_una_linea_por_clave() {
        let recs = vec![
            KeyValue::new("b", "1"),
            KeyValue::new("a", "1"),
            KeyValue::new("b", "1"),
        ];
        let mut buf: Vec<u8> = Vec::new();
        let n = reduce_records_to_writer(&WordCount, recs, &mut buf).unwrap();

        assert_eq!(n, 2);
        assert_eq!(String::from_utf8(buf).unwrap(), "a 1\nb 2\n");
    }
}
