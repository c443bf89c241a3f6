//! Default configuration values

/// Directory under `$HOME` holding all sources when no source root is given
pub const DEFAULT_SOURCE_DIR_NAME: &str = "cheri";

/// Output root, relative to the source root
pub const OUTPUT_DIR_NAME: &str = "output";

/// Extra files for the disk image, relative to the source root
pub const EXTRA_FILES_DIR_NAME: &str = "extra-files";

/// Disk image file name, relative to the output root
pub const DISK_IMAGE_NAME: &str = "disk.img";

/// Installed guest tree, relative to the output root
pub const ROOTFS_DIR_NAME: &str = "rootfs";

/// CheriBSD checkout, relative to the source root
pub const CHERIBSD_DIR_NAME: &str = "cheribsd";

/// CheriBSD object directory, relative to the output root
pub const CHERIBSD_OBJ_DIR_NAME: &str = "cheribsd-obj";

/// QEMU, binutils and LLVM install prefix, relative to the output root
pub const HOST_TOOLS_DIR_NAME: &str = "host-tools";

/// mtree manifest written by an unprivileged `installworld`
pub const MANIFEST_FILE_NAME: &str = "METALOG";

/// Hosts with more CPUs than this are assumed to be shared build machines
pub const SHARED_HOST_CPU_THRESHOLD: usize = 24;

/// Job count used on shared build machines
pub const SHARED_HOST_JOBS: usize = 16;

/// Default number of build jobs for a host with `cpus` CPUs
pub fn default_jobs_for(cpus: usize) -> usize {
    if cpus > SHARED_HOST_CPU_THRESHOLD {
        SHARED_HOST_JOBS
    } else {
        cpus.max(1)
    }
}

/// Default number of build jobs for this host
pub fn default_jobs() -> usize {
    default_jobs_for(num_cpus::get())
}
