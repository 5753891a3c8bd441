//! Row predictors applied after a filter has decoded its data.

use crate::error::{PdfError, Result};

/// Predictor parameters taken from a filter's `DecodeParms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictorParams {
    pub predictor: i64,
    pub colors: usize,
    pub bits_per_component: usize,
    pub columns: usize,
}

impl Default for PredictorParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
        }
    }
}

/// Undo the predictor declared by `params`.
///
/// Predictor 1 is a no-op and values >= 10 select PNG row prediction;
/// anything else (including TIFF predictor 2) is unsupported.
pub fn apply_predictor(data: &[u8], params: &PredictorParams) -> Result<Vec<u8>> {
    match params.predictor {
        1 => Ok(data.to_vec()),
        p if p >= 10 => apply_png_predictor(
            data,
            params.columns,
            params.colors,
            params.bits_per_component,
        ),
        p => Err(PdfError::DecodeError(format!("unsupported predictor: {p}"))),
    }
}

/// Reverse PNG row filtering. Each row carries a leading filter-type byte;
/// the previous row starts zeroed. Only None, Sub, Up and Average rows
/// are supported.
pub fn apply_png_predictor(
    data: &[u8],
    columns: usize,
    colors: usize,
    bits_per_component: usize,
) -> Result<Vec<u8>> {
    let pixel_bits = colors
        .checked_mul(bits_per_component)
        .ok_or_else(|| PdfError::DecodeError("predictor pixel size overflows".into()))?;
    let row_bytes = pixel_bits
        .checked_mul(columns)
        .ok_or_else(|| PdfError::DecodeError("predictor row size overflows".into()))?
        .div_ceil(8);
    if row_bytes > data.len() {
        return Err(PdfError::DecodeError(format!(
            "predictor row of {row_bytes} bytes exceeds {} bytes of data",
            data.len()
        )));
    }
    let bpp = (pixel_bits / 8).max(1);
    let row_size = row_bytes + 1;

    let mut result = Vec::with_capacity(data.len());
    let mut prev_row = vec![0u8; row_bytes];
    let mut current_row = vec![0u8; row_bytes];

    for row in data.chunks_exact(row_size) {
        let filter_type = row[0];
        let row_data = &row[1..];

        match filter_type {
            0 => current_row.copy_from_slice(row_data),
            1 => {
                for i in 0..row_bytes {
                    let left = if i >= bpp { current_row[i - bpp] } else { 0 };
                    current_row[i] = row_data[i].wrapping_add(left);
                }
            }
            2 => {
                for i in 0..row_bytes {
                    current_row[i] = row_data[i].wrapping_add(prev_row[i]);
                }
            }
            3 => {
                for i in 0..row_bytes {
                    let left = if i >= bpp { u16::from(current_row[i - bpp]) } else { 0 };
                    let above = u16::from(prev_row[i]);
                    current_row[i] = row_data[i].wrapping_add(((left + above) / 2) as u8);
                }
            }
            t => {
                return Err(PdfError::DecodeError(format!(
                    "unsupported PNG row filter: {t}"
                )));
            }
        }

        result.extend_from_slice(&current_row);
        std::mem::swap(&mut prev_row, &mut current_row);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_rows_accumulate() {
        let data = [2, 1, 2, 2, 1, 1];
        assert_eq!(apply_png_predictor(&data, 2, 1, 8).unwrap(), vec![1, 2, 2, 3]);
    }

    #[test]
    fn sub_uses_left_neighbour() {
        let data = [1, 5, 1, 1];
        assert_eq!(apply_png_predictor(&data, 3, 1, 8).unwrap(), vec![5, 6, 7]);
    }

    #[test]
    fn average_against_zero_first_row() {
        let data = [3, 4, 4];
        assert_eq!(apply_png_predictor(&data, 2, 1, 8).unwrap(), vec![4, 6]);
    }

    #[test]
    fn predictor_one_is_noop() {
        let params = PredictorParams::default();
        assert_eq!(apply_predictor(b"raw", &params).unwrap(), b"raw");
    }

    #[test]
    fn tiff_and_paeth_are_unsupported() {
        let tiff = PredictorParams {
            predictor: 2,
            ..Default::default()
        };
        assert!(apply_predictor(b"raw", &tiff).is_err());
        assert!(apply_png_predictor(&[4, 1], 1, 1, 8).is_err());
    }

    #[test]
    fn oversized_rows_are_rejected() {
        let err = apply_png_predictor(&[2, 1, 2], 1 << 62, 4, 8).unwrap_err();
        assert!(matches!(err, PdfError::DecodeError(_)));
        assert!(apply_png_predictor(&[2, 1, 2], 4, 1, 8).is_err());
        assert!(apply_png_predictor(&[0, 1], usize::MAX, usize::MAX, 1).is_err());
    }
}
