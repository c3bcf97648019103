//! Kernel attribute file helpers.
//!
//! sysfs attributes hold one short value followed by a newline.

use std::path::Path;

use crate::error::{SysfsError, SysfsResult};

pub(crate) fn read(path: &Path) -> SysfsResult<String> {
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|source| SysfsError::Read {
            path: path.to_path_buf(),
            source,
        })
}

pub(crate) fn read_u32(path: &Path) -> SysfsResult<u32> {
    let value = read(path)?;
    value.parse().map_err(|_| SysfsError::Value {
        path: path.to_path_buf(),
        value,
    })
}

pub(crate) fn write(path: &Path, value: &str) -> SysfsResult<()> {
    std::fs::write(path, value).map_err(|source| SysfsError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a kernel cpu list such as `0-3,6,8-9`.
///
/// The result is sorted and free of duplicates. An empty string is an
/// empty list.
pub fn parse_cpu_list(list: &str) -> SysfsResult<Vec<usize>> {
    let malformed = || SysfsError::CpuList(list.to_string());
    let mut cpus = Vec::new();

    for part in list.trim().split(',').filter(|p| !p.trim().is_empty()) {
        let part = part.trim();
        match part.split_once('-') {
            Some((start, end)) => {
                let start: usize = start.trim().parse().map_err(|_| malformed())?;
                let end: usize = end.trim().parse().map_err(|_| malformed())?;
                if end < start {
                    return Err(malformed());
                }
                cpus.extend(start..=end);
            }
            None => cpus.push(part.parse().map_err(|_| malformed())?),
        }
    }

    cpus.sort_unstable();
    cpus.dedup();
    Ok(cpus)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ranges_and_singles() {
        assert_eq!(parse_cpu_list("0-3").unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(parse_cpu_list("0,2,4-5\n").unwrap(), vec![0, 2, 4, 5]);
        assert_eq!(parse_cpu_list("3,0-1,1").unwrap(), vec![0, 1, 3]);
    }

    #[test]
    fn empty_list_is_empty() {
        assert!(parse_cpu_list("").unwrap().is_empty());
        assert!(parse_cpu_list("\n").unwrap().is_empty());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_cpu_list("0-x"), Err(SysfsError::CpuList(_))));
        assert!(matches!(parse_cpu_list("4-2"), Err(SysfsError::CpuList(_))));
        assert!(matches!(parse_cpu_list("cpu0"), Err(SysfsError::CpuList(_))));
    }

    #[test]
    fn read_u32_reports_bad_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaling_max_freq");
        std::fs::write(&path, "fast\n").unwrap();
        assert!(matches!(read_u32(&path), Err(SysfsError::Value { .. })));

        std::fs::write(&path, "1512000\n").unwrap();
        assert_eq!(read_u32(&path).unwrap(), 1_512_000);
    }
}
