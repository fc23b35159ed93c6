// Where the bookings export is looked up.
//
// The default lives next to the installed binary, not the working directory:
// `<exe dir>/../data/raw/ncr_ride_bookings.csv`.
use std::io;
use std::path::{Path, PathBuf};

pub const DATA_FILE_NAME: &str = "ncr_ride_bookings.csv";

/// Environment variable consulted by the CLI for `--data`.
pub const DATA_ENV_VAR: &str = "RIDE_DASHBOARD_DATA";

/// Default data path derived from a given executable location.
pub fn data_path_for_exe(exe: &Path) -> PathBuf {
    let base = exe.parent().unwrap_or_else(|| Path::new("."));
    base.join("..").join("data").join("raw").join(DATA_FILE_NAME)
}

/// An explicit path wins; otherwise use the default beside the executable.
pub fn resolve_data_path(explicit: Option<&Path>) -> io::Result<PathBuf> {
    match explicit {
        Some(p) => Ok(p.to_path_buf()),
        None => Ok(data_path_for_exe(&std::env::current_exe()?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_is_relative_to_exe() {
        let p = data_path_for_exe(Path::new("/opt/dash/bin/ride_dashboard"));
        assert_eq!(
            p,
            PathBuf::from("/opt/dash/bin/../data/raw/ncr_ride_bookings.csv")
        );
    }

    #[test]
    fn test_explicit_path_wins() {
        let p = resolve_data_path(Some(Path::new("bookings.csv"))).unwrap();
        assert_eq!(p, PathBuf::from("bookings.csv"));
    }
}
