//! PackBits RLE encoding for the merged image section
//!
//! PackBits is the compression algorithm used in PSD files.
//! Reference: Apple Technical Note TN1023

/// Longest run or literal a single PackBits header can describe
const MAX_PACKET: usize = 128;

/// Encode data using PackBits RLE compression
///
/// Algorithm rules:
/// - N >= 0: Next N+1 bytes are literal (copy as-is)
/// - -127 <= N < 0: Repeat next byte (1-N) times
/// - N = -128: No operation (never emitted)
pub fn packbits_encode(input: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len() / 2 + 2);
    let mut i = 0;

    while i < input.len() {
        let run_len = run_length(&input[i..]);

        if run_len >= 3 {
            // For run_len = 3, we write -2 (0xFE), byte
            output.push((1_i16 - run_len as i16) as u8);
            output.push(input[i]);
            i += run_len;
            continue;
        }

        // Literal sequence until the next run of 3+ or the packet limit
        let start = i;
        while i < input.len() && i - start < MAX_PACKET {
            if i > start && run_length(&input[i..]) >= 3 {
                break;
            }
            i += 1;
        }

        output.push((i - start - 1) as u8);
        output.extend_from_slice(&input[start..i]);
    }

    output
}

/// Number of leading bytes equal to the first one, capped at one packet
fn run_length(data: &[u8]) -> usize {
    match data.first() {
        Some(&first) => data
            .iter()
            .take(MAX_PACKET)
            .take_while(|&&b| b == first)
            .count(),
        None => 0,
    }
}

/// RLE-encode a plane row by row
///
/// Returns the per-row compressed byte counts and the concatenated rows.
/// Identical consecutive rows (the common case for blank planes) are
/// encoded once.
pub fn encode_plane(plane: &[u8], row_bytes: usize) -> (Vec<u16>, Vec<u8>) {
    if row_bytes == 0 {
        return (Vec::new(), Vec::new());
    }

    let rows = plane.len() / row_bytes;
    let mut row_counts = Vec::with_capacity(rows);
    let mut compressed = Vec::new();
    let mut previous: Option<(&[u8], Vec<u8>)> = None;

    for row in plane.chunks_exact(row_bytes) {
        let encoded = match &previous {
            Some((last_row, last_encoded)) if *last_row == row => last_encoded.clone(),
            _ => packbits_encode(row),
        };
        row_counts.push(encoded.len() as u16);
        compressed.extend_from_slice(&encoded);
        previous = Some((row, encoded));
    }

    (row_counts, compressed)
}

/// Decode PackBits data, used to verify what the writer produced
#[cfg(test)]
pub fn packbits_decode(input: &[u8]) -> Vec<u8> {
    let mut output = Vec::new();
    let mut i = 0;

    while i < input.len() {
        let n = input[i] as i8;
        i += 1;
        if n >= 0 {
            let count = n as usize + 1;
            output.extend_from_slice(&input[i..i + count]);
            i += count;
        } else if n > -128 {
            let count = (1 - n as i16) as usize;
            output.extend(std::iter::repeat(input[i]).take(count));
            i += 1;
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_empty() {
        assert!(packbits_encode(&[]).is_empty());
    }

    #[test]
    fn test_encode_run() {
        // -4 (0xFC) means repeat 5 times, then the byte
        assert_eq!(packbits_encode(&[0xAA; 5]), vec![0xFC, 0xAA]);
    }

    #[test]
    fn test_encode_mixed() {
        let input = vec![1, 2, 3, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA];
        // [2, 1, 2, 3] (3 literals) + [0xFC, 0xAA] (5-run)
        assert_eq!(packbits_encode(&input), vec![2, 1, 2, 3, 0xFC, 0xAA]);
    }

    #[test]
    fn test_long_zero_row() {
        let row = vec![0u8; 1000];
        let encoded = packbits_encode(&row);
        // 7 full runs of 128 + one run of 104
        assert_eq!(encoded.len(), 16);
        assert_eq!(packbits_decode(&encoded), row);
    }

    #[test]
    fn test_long_literal_is_split() {
        let row: Vec<u8> = (0..300).map(|i| (i % 251) as u8).collect();
        let encoded = packbits_encode(&row);
        assert_eq!(encoded[0], 127);
        assert_eq!(packbits_decode(&encoded), row);
    }

    #[test]
    fn test_encode_plane_rows() {
        let mut plane = vec![0u8; 30];
        plane[25] = 9;
        let (counts, data) = encode_plane(&plane, 10);
        assert_eq!(counts.len(), 3);
        assert_eq!(counts[0], counts[1]);
        assert_eq!(
            counts.iter().map(|&c| c as usize).sum::<usize>(),
            data.len()
        );
        assert_eq!(packbits_decode(&data), plane);
    }
}
