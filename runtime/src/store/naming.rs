// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Deterministic artifact filenames.
//!
//! `<type>_n<number>_<first five subject words>.txt`, ASCII only, at most
//! [`MAX_FILENAME_LEN`] characters. Accented Latin letters are folded to
//! their base letter before filtering, so `Resolução` becomes `Resolucao`.

use crate::record::strip_float_suffix;

/// Upper bound on an artifact filename, extension included.
pub const MAX_FILENAME_LEN: usize = 200;

const SUBJECT_WORDS: usize = 5;
const EXTENSION: &str = ".txt";
const TRUNCATED_TAIL: &str = "...txt";

/// Filename of the text artifact for `(doc_type, number, subject)`.
pub fn artifact_filename(doc_type: &str, number: &str, subject: &str) -> String {
    let stem = artifact_stem(doc_type, number, subject);
    let filename = format!("{stem}{EXTENSION}");
    if filename.len() <= MAX_FILENAME_LEN {
        return filename;
    }
    // ASCII only past this point, so byte length equals char count
    let keep = MAX_FILENAME_LEN - TRUNCATED_TAIL.len();
    format!("{}{TRUNCATED_TAIL}", &filename[..keep])
}

/// Filename stem shared by the artifact, its sidecar and debug snapshots.
pub fn artifact_stem(doc_type: &str, number: &str, subject: &str) -> String {
    let type_part: String = fold_accents(doc_type)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    let number_part: String = strip_float_suffix(number.trim())
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let subject_part = fold_accents(subject)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .take(SUBJECT_WORDS)
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();

    if subject_part.is_empty() {
        format!("{type_part}_n{number_part}")
    } else {
        format!("{type_part}_n{number_part}_{subject_part}")
    }
}

/// Sidecar filename for an artifact filename.
pub fn sidecar_filename(artifact_filename: &str) -> String {
    let stem = artifact_filename
        .strip_suffix(EXTENSION)
        .unwrap_or(artifact_filename);
    format!("{stem}.pdf")
}

fn fold_accents(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

fn fold_char(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'ñ' => 'n',
        'Ñ' => 'N',
        other => other,
    }
}
