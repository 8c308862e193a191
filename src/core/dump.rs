//! Embedded-binary header generation
//!
//! Compresses built native binaries and the stub APK and emits them as
//! C data tables for the next native build stage to embed. The XZ
//! streams carry no integrity check; the consumer re-validates the
//! payload through its own mechanism and every byte saved here shrinks
//! the final executables.

use std::io::Write;
use std::path::Path;

use liblzma::stream::{Check, Stream};
use liblzma::write::XzEncoder;

use crate::config::defaults;
use crate::error::DumpError;

/// XZ preset, maximum compression
const XZ_PRESET: u32 = 9;

/// Compress a byte stream with xz, preset 9, no integrity check
pub fn xz(data: &[u8]) -> Result<Vec<u8>, DumpError> {
    let stream = Stream::new_easy_encoder(XZ_PRESET, Check::None)
        .map_err(|e| DumpError::XzStream(e.to_string()))?;
    let mut encoder = XzEncoder::new_stream(Vec::new(), stream);
    encoder
        .write_all(data)
        .and_then(|()| encoder.finish())
        .map_err(|e| DumpError::XzStream(e.to_string()))
}

/// Render bytes as a C constant array, 16 hexadecimal values per line
pub fn render_data_table(name: &str, bytes: &[u8]) -> String {
    let mut out = format!("constexpr unsigned char {name}[] = {{");
    for (i, byte) in bytes.iter().enumerate() {
        if i % 16 == 0 {
            out.push('\n');
        }
        out.push_str(&format!("0x{byte:02X},"));
    }
    out.push_str("\n};\n");
    out
}

/// Generate the embedded-binary headers for the magiskinit build
///
/// Each 32-bit output directory receives a header embedding its own
/// magisk binary and a second one embedding the matching 64-bit binary;
/// the stub APK lands in a shared header. Missing inputs are fatal and
/// name the build step to run first.
pub fn dump_bin_headers(project_dir: &Path, out_dir: &Path) -> Result<(), DumpError> {
    let native_out = project_dir.join("native").join("out");

    for arch in defaults::ARCHS_32 {
        let bin_file = native_out.join(arch).join("magisk");
        let header = native_out.join(arch).join("binaries_arch.h");
        dump_binary(&bin_file, &header, "magisk_xz")?;
    }

    for (arch64, arch32) in defaults::ARCHS_64.iter().zip(defaults::ARCHS_32) {
        let bin_file = native_out.join(arch64).join("magisk");
        let header = native_out.join(arch32).join("binaries_arch64.h");
        dump_binary(&bin_file, &header, "magisk_xz")?;
    }

    let stub = out_dir.join("stub-release.apk");
    if !stub.exists() {
        return Err(DumpError::MissingStub { path: stub });
    }
    let data = read_bytes(&stub)?;
    write_header(&native_out.join("binaries.h"), "manager_xz", &data)?;

    Ok(())
}

fn dump_binary(bin_file: &Path, header: &Path, var_name: &str) -> Result<(), DumpError> {
    if !bin_file.exists() {
        return Err(DumpError::MissingBinary {
            path: bin_file.to_path_buf(),
            target: "magisk".to_string(),
        });
    }
    let data = read_bytes(bin_file)?;
    write_header(header, var_name, &data)
}

fn write_header(header: &Path, var_name: &str, data: &[u8]) -> Result<(), DumpError> {
    let table = render_data_table(var_name, &xz(data)?);
    std::fs::write(header, table).map_err(|e| DumpError::Io {
        path: header.to_path_buf(),
        error: e.to_string(),
    })?;
    tracing::debug!("Generated {}", header.display());
    Ok(())
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, DumpError> {
    std::fs::read(path).map_err(|e| DumpError::Io {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}
