//! Test utilities shared by the crate's unit tests.
//!
//! Only compiled under `cfg(test)`.

pub mod cap_fs {
    //! Capability-safe filesystem helpers for tests.
    //!
    //! The crate avoids direct `std::fs` calls. These helpers wrap
    //! `cap_std::fs::Dir` so suites share the same policy-compliant access.

    use std::ffi::OsString;
    use std::io;
    use std::path::Path;

    use cap_std::{ambient_authority, fs::Dir};

    /// Read a whole file through `cap_std`.
    pub fn read_file(path: &Path) -> io::Result<Vec<u8>> {
        let (parent, file_name) = parent_and_file_name(path)?;
        let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
        directory.read(Path::new(&file_name))
    }

    /// Return true when `path` exists, false when it does not.
    pub fn path_exists(path: &Path) -> bool {
        let Ok((parent, file_name)) = parent_and_file_name(path) else {
            return false;
        };
        let Ok(directory) = Dir::open_ambient_dir(parent, ambient_authority()) else {
            return false;
        };
        directory.exists(Path::new(&file_name))
    }

    fn parent_and_file_name(path: &Path) -> io::Result<(&Path, OsString)> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = path.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "path must include a file or directory name",
            )
        })?;
        Ok((parent, file_name.to_os_string()))
    }
}

pub mod clock {
    //! Controllable clocks.

    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
    use mockable::Clock;

    /// 2025-01-10T09:00:00Z.
    pub fn fixture_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0)
            .single()
            .expect("valid fixture timestamp")
    }

    /// Clock that only moves when told to.
    pub struct MutableClock(Mutex<DateTime<Utc>>);

    impl MutableClock {
        pub fn new(now: DateTime<Utc>) -> Self {
            Self(Mutex::new(now))
        }

        pub fn advance(&self, delta: Duration) {
            let delta = match TimeDelta::from_std(delta) {
                Ok(delta) => delta,
                Err(error) => {
                    panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}")
                }
            };
            *self.lock_clock() += delta;
        }

        fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
            match self.0.lock() {
                Ok(guard) => guard,
                Err(_) => panic!("clock mutex"),
            }
        }
    }

    impl Clock for MutableClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            *self.lock_clock()
        }
    }

    /// Clock frozen at [`fixture_timestamp`].
    pub fn fixture_clock() -> Arc<dyn Clock> {
        Arc::new(MutableClock::new(fixture_timestamp()))
    }
}
