//! Test utilities shared by unit tests and the integration suites.
//!
//! Compiled for `cfg(test)` and behind the `test-support` feature, which the
//! crate's own dev-dependency entry enables for `tests/`.

pub mod cap_fs {
    //! Capability-safe filesystem helpers for tests.
    //!
    //! Direct `std::fs` calls are avoided throughout the crate; tests write
    //! legacy snapshot files through `cap_std::fs::Dir` instead.

    use std::ffi::OsString;
    use std::io;
    use std::path::Path;

    use cap_std::{ambient_authority, fs::Dir};

    /// Read a UTF-8 text file through `cap_std`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fixtrack::test_support::cap_fs::{read_file_to_string, write_file};
    ///
    /// let path = std::env::temp_dir().join("cap-fs-read-example.txt");
    /// write_file(&path, b"hello\n")?;
    ///
    /// let content = read_file_to_string(&path)?;
    /// assert_eq!(content, "hello\n");
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn read_file_to_string(path: &Path) -> io::Result<String> {
        let (parent, file_name) = parent_and_file_name(path)?;
        let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
        directory.read_to_string(Path::new(&file_name))
    }

    /// Write bytes to a file through `cap_std`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fixtrack::test_support::cap_fs::{read_file_to_string, write_file};
    ///
    /// let path = std::env::temp_dir().join("cap-fs-write-example.txt");
    /// write_file(&path, b"snapshot\n")?;
    /// assert_eq!(read_file_to_string(&path)?, "snapshot\n");
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn write_file(path: &Path, contents: &[u8]) -> io::Result<()> {
        let (parent, file_name) = parent_and_file_name(path)?;
        let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
        directory.write(Path::new(&file_name), contents)
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

pub mod clock;
pub mod credentials;
pub mod memory;

pub use clock::MutableClock;
pub use credentials::PlaintextHasher;
pub use memory::InMemoryStore;
