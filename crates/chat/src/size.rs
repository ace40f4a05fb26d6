//! Lesbare Dateigroessen

const EINHEITEN: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Formatiert eine Byte-Anzahl in 1024er-Schritten mit zwei Nachkommastellen
///
/// Gewaehlt wird die groesste Einheit, in der der Wert noch >= 1 ist
/// (hoechstens TB). `0` ergibt `"0 Bytes"`.
pub fn human_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut wert = bytes as f64;
    let mut index = 0;
    while wert >= 1024.0 && index < EINHEITEN.len() - 1 {
        wert /= 1024.0;
        index += 1;
    }

    format!("{wert:.2} {}", EINHEITEN[index])
}
