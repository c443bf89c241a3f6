//! Remote repository URLs

/// GitHub organisation hosting the CHERI forks
pub const CTSRD_CHERI: &str = "https://github.com/CTSRD-CHERI";

/// Binutils fork with CHERI support
pub const BINUTILS_REPO: &str = "https://github.com/CTSRD-CHERI/binutils.git";

/// QEMU fork emulating the CHERI MIPS extensions
pub const QEMU_REPO: &str = "https://github.com/CTSRD-CHERI/qemu.git";

/// LLVM fork
pub const LLVM_REPO: &str = "https://github.com/CTSRD-CHERI/llvm.git";

/// Clang fork, checked out inside the LLVM tree at `tools/clang`
pub const CLANG_REPO: &str = "https://github.com/CTSRD-CHERI/clang.git";

/// LLDB fork, checked out inside the LLVM tree at `tools/lldb`
pub const LLDB_REPO: &str = "https://github.com/CTSRD-CHERI/lldb.git";

/// CheriBSD operating system sources
pub const CHERIBSD_REPO: &str = "https://github.com/CTSRD-CHERI/cheribsd.git";
