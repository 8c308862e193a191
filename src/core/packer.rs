//! Update-binary packing
//!
//! Builds the polyglot update-binary blob: a shell script padded to one
//! header block, followed by two embedded architecture-specific
//! executables. The primary executable is zero-padded to a whole number
//! of blocks so the script can seek to the secondary one with a
//! fixed-size read loop, without any out-of-band index.
//!
//! Blob layout for block size BS and block count N = ceil(len(primary)/BS):
//!
//! ```text
//! [0, BS)            script, zero padded, block-count token resolved
//! [BS, BS + N*BS)    primary executable, zero padded
//! [BS + N*BS, EOF)   secondary executable, unpadded
//! ```

use std::path::Path;

use crate::config::defaults;
use crate::error::{ArchiveError, PackError};

/// Pack a script and two embedded executables into an update-binary blob
///
/// `token` must occur in `script_template` and is replaced with the
/// decimal block count of `primary`. The substituted script has to fit
/// inside one `block_size` header block.
pub fn pack(
    block_size: usize,
    script_template: &[u8],
    primary: &[u8],
    secondary: &[u8],
    token: &str,
) -> Result<Vec<u8>, PackError> {
    if block_size == 0 {
        return Err(PackError::ZeroBlockSize);
    }
    if primary.is_empty() {
        return Err(PackError::EmptyBinary { slot: "primary" });
    }
    if secondary.is_empty() {
        return Err(PackError::EmptyBinary { slot: "secondary" });
    }

    let blk_cnt = primary.len().div_ceil(block_size);
    let script = substitute(script_template, token, &blk_cnt.to_string())?;
    if script.len() > block_size {
        return Err(PackError::ScriptTooLong {
            len: script.len(),
            block_size,
        });
    }

    let mut blob = Vec::with_capacity(block_size + blk_cnt * block_size + secondary.len());
    blob.extend_from_slice(&script);
    blob.resize(block_size, 0);
    blob.extend_from_slice(primary);
    blob.resize(block_size + blk_cnt * block_size, 0);
    blob.extend_from_slice(secondary);
    Ok(blob)
}

/// Replace the first occurrence of `token` with `value`
fn substitute(template: &[u8], token: &str, value: &str) -> Result<Vec<u8>, PackError> {
    let needle = token.as_bytes();
    let pos = template
        .windows(needle.len())
        .position(|window| window == needle)
        .ok_or_else(|| PackError::TokenMissing {
            token: token.to_string(),
        })?;

    let mut out = Vec::with_capacity(template.len() - needle.len() + value.len());
    out.extend_from_slice(&template[..pos]);
    out.extend_from_slice(value.as_bytes());
    out.extend_from_slice(&template[pos + needle.len()..]);
    Ok(out)
}

/// Build the update-binary blob from the project's working tree
///
/// Reads the two busybox executables and the script template; a missing
/// source is fatal and names the path.
pub fn update_binary(project_dir: &Path) -> Result<Vec<u8>, ArchiveError> {
    let x86 = read_source(&project_dir.join("native/out/x86/busybox"))?;
    let arm = read_source(&project_dir.join("native/out/armeabi-v7a/busybox"))?;
    let script = read_source(&project_dir.join("scripts/update_binary.sh"))?;

    Ok(pack(
        defaults::BLOCK_SIZE,
        &script,
        &x86,
        &arm,
        defaults::BLOCK_COUNT_TOKEN,
    )?)
}

fn read_source(path: &Path) -> Result<Vec<u8>, ArchiveError> {
    if !path.exists() {
        return Err(ArchiveError::MissingSource {
            path: path.to_path_buf(),
        });
    }
    std::fs::read(path).map_err(|e| ArchiveError::Io {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BS: usize = 1024;
    const TOKEN: &str = "__X86_CNT__";

    #[test]
    fn test_pack_layout() {
        let script = b"#!/bin/sh\ncount=__X86_CNT__\n";
        let primary = vec![0xAA; 2000];
        let secondary = vec![0xBB; 500];

        let blob = pack(BS, script, &primary, &secondary, TOKEN).unwrap();

        // 2000 bytes round up to 2 blocks
        assert_eq!(blob.len(), 1024 + 2 * 1024 + 500);
        assert_eq!(&blob[1024..1024 + 2000], &primary[..]);
        assert!(blob[1024 + 2000..3 * 1024].iter().all(|&b| b == 0));
        assert_eq!(&blob[3 * 1024..], &secondary[..]);

        let text = String::from_utf8_lossy(&blob[..BS]);
        assert!(text.starts_with("#!/bin/sh\ncount=2\n"));
        assert!(!text.contains(TOKEN));
    }

    #[test]
    fn test_pack_script_padded_with_zeros() {
        let blob = pack(BS, b"x=__X86_CNT__", &[1], &[2], TOKEN).unwrap();
        assert!(blob[4..BS].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_exact_block_multiple_gets_no_extra_block() {
        let primary = vec![7; 2 * BS];
        let blob = pack(BS, b"n=__X86_CNT__", &primary, &[9], TOKEN).unwrap();
        assert_eq!(blob.len(), BS + 2 * BS + 1);
        assert!(String::from_utf8_lossy(&blob[..BS]).starts_with("n=2"));
    }

    #[test]
    fn test_missing_token_fails() {
        let err = pack(BS, b"#!/bin/sh\n", &[1], &[2], TOKEN).unwrap_err();
        assert_eq!(
            err,
            PackError::TokenMissing {
                token: TOKEN.to_string()
            }
        );
    }

    #[test]
    fn test_oversized_script_fails() {
        let mut script = vec![b'#'; BS + 10];
        script.splice(0..0, b"__X86_CNT__".iter().copied());
        let err = pack(BS, &script, &[1], &[2], TOKEN).unwrap_err();
        assert!(matches!(err, PackError::ScriptTooLong { block_size: BS, .. }));
    }

    #[test]
    fn test_script_exactly_block_size_fits() {
        // 13-byte template shrinks to 3 bytes after substitution, then
        // pad the template so the result is exactly BS
        let mut script = b"n=__X86_CNT__".to_vec();
        script.extend(std::iter::repeat(b'#').take(BS - 3));
        let blob = pack(BS, &script, &[1], &[2], TOKEN).unwrap();
        assert_eq!(blob.len(), BS + BS + 1);
    }

    #[test]
    fn test_empty_binaries_fail() {
        assert_eq!(
            pack(BS, b"__X86_CNT__", &[], &[2], TOKEN).unwrap_err(),
            PackError::EmptyBinary { slot: "primary" }
        );
        assert_eq!(
            pack(BS, b"__X86_CNT__", &[1], &[], TOKEN).unwrap_err(),
            PackError::EmptyBinary { slot: "secondary" }
        );
    }

    #[test]
    fn test_zero_block_size_fails() {
        assert_eq!(
            pack(0, b"__X86_CNT__", &[1], &[2], TOKEN).unwrap_err(),
            PackError::ZeroBlockSize
        );
    }

    #[test]
    fn test_update_binary_names_missing_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = update_binary(dir.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("native/out/x86/busybox"), "{message}");
    }

    proptest! {
        #[test]
        fn prop_output_length(
            primary_len in 1usize..8192,
            secondary_len in 1usize..2048
        ) {
            let primary = vec![0x11; primary_len];
            let secondary = vec![0x22; secondary_len];
            let blob = pack(BS, b"c=__X86_CNT__\n", &primary, &secondary, TOKEN).unwrap();

            let blk_cnt = primary_len.div_ceil(BS);
            prop_assert_eq!(blob.len(), BS + blk_cnt * BS + secondary_len);
            prop_assert_eq!(&blob[BS..BS + primary_len], &primary[..]);
            prop_assert_eq!(&blob[BS + blk_cnt * BS..], &secondary[..]);
        }

        #[test]
        fn prop_deterministic(
            primary in proptest::collection::vec(any::<u8>(), 1..4096),
            secondary in proptest::collection::vec(any::<u8>(), 1..1024)
        ) {
            let a = pack(BS, b"c=__X86_CNT__\n", &primary, &secondary, TOKEN).unwrap();
            let b = pack(BS, b"c=__X86_CNT__\n", &primary, &secondary, TOKEN).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
