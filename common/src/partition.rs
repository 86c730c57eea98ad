/// FNV-1a de 32 bits sobre los bytes de la clave, sin el bit de signo.
///
/// Tiene que ser estable entre procesos: todos los workers mandan la misma
/// clave a la misma partición.
pub fn ihash(key: &str) -> u32 {
    const FNV_OFFSET: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 0x0100_0193;

    let mut h = FNV_OFFSET;
    for b in key.as_bytes() {
        h ^= *b as u32;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h & 0x7fff_ffff
}

/// Partición de reduce (en `[0, n_reduce)`) que le toca a una clave.
pub fn partition_for(key: &str, n_reduce: u32) -> u32 {
    ihash(key) % n_reduce
}
