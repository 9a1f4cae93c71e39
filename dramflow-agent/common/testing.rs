// Test fixtures: a throwaway sysfs-like directory tree

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

pub struct FakeSysfs {
    root: PathBuf,
}

impl FakeSysfs {
    pub fn new() -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let root = std::env::temp_dir().join(format!(
            "dramflow-test-{}-{}",
            std::process::id(),
            id
        ));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(&root).unwrap();
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    pub fn mkdir(&self, rel: &str) {
        fs::create_dir_all(self.root.join(rel)).unwrap();
    }

    /// Register a uncore_imc-style device with CAS_COUNT events
    pub fn add_imc(&self, dev: &str, pmu_type: i64) {
        self.write(&format!("{dev}/type"), &format!("{pmu_type}\n"));
        self.write(
            &format!("{dev}/events/cas_count_read"),
            "event=0x04,umask=0x03\n",
        );
        self.write(
            &format!("{dev}/events/cas_count_read.scale"),
            "6.103515625e-5\n",
        );
        self.write(&format!("{dev}/events/cas_count_read.unit"), "MiB\n");
        self.write(
            &format!("{dev}/events/cas_count_write"),
            "event=0x04,umask=0x0c\n",
        );
        self.write(
            &format!("{dev}/events/cas_count_write.scale"),
            "6.103515625e-5\n",
        );
        self.write(&format!("{dev}/events/cas_count_write.unit"), "MiB\n");
    }
}

impl Drop for FakeSysfs {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}
