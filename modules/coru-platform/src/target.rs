//! Target classification
//!
//! Shared between the build script, which turns the result into `cfg`s, and
//! the unit tests. Thumb state and the hard-float ABI are not visible to
//! stable `cfg(target_feature)`, so they are read off the target triple.

/// Context switch backend selected for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    X86,
    X86_64,
    /// Thumb, soft-float ABI
    Thumb,
    /// Thumb, hard-float ABI: s16-s31 are callee saved too
    ThumbVfp,
    Mips,
    Aarch64,
    Riscv64,
}

/// What the build script knows about the target
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    /// Full triple, e.g. `thumbv7em-none-eabihf`
    pub triple: &'a str,
    pub arch: &'a str,
    pub os: &'a str,
    pub vendor: &'a str,
}

impl Backend {
    /// `cfg` names the backend is compiled under, on top of `target_arch`.
    pub fn cfgs(self) -> &'static [&'static str] {
        match self {
            Backend::Thumb => &["coru_thumb"],
            Backend::ThumbVfp => &["coru_thumb", "coru_thumb_vfp"],
            _ => &[],
        }
    }
}

/// Every `cfg` [`Backend::cfgs`] can emit
pub const CFGS: &[&str] = &["coru_thumb", "coru_thumb_vfp"];

/// Pick the backend for `target`, or say why there is none.
pub fn select(target: &Target<'_>) -> Result<Backend, &'static str> {
    // the switch routines are plain ELF assembly
    if target.os == "windows" || target.vendor == "apple" {
        return Err("only ELF targets are supported");
    }
    match target.arch {
        "x86" => Ok(Backend::X86),
        "x86_64" => Ok(Backend::X86_64),
        "mips" => Ok(Backend::Mips),
        "aarch64" => Ok(Backend::Aarch64),
        "riscv64" => Ok(Backend::Riscv64),
        "arm" if target.triple.starts_with("thumb") => {
            if target.triple.ends_with("eabihf") {
                Ok(Backend::ThumbVfp)
            } else {
                Ok(Backend::Thumb)
            }
        }
        // ARM state would need its own switch routine
        "arm" => Err("ARM targets are supported in Thumb state only"),
        _ => Err("no context switch backend for this target arch"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target<'a>(triple: &'a str, arch: &'a str) -> Target<'a> {
        Target {
            triple,
            arch,
            os: "none",
            vendor: "unknown",
        }
    }

    #[test]
    fn test_thumb_is_read_from_triple() {
        assert_eq!(select(&target("thumbv6m-none-eabi", "arm")), Ok(Backend::Thumb));
        assert_eq!(select(&target("thumbv7m-none-eabi", "arm")), Ok(Backend::Thumb));
        assert_eq!(Backend::Thumb.cfgs(), ["coru_thumb"]);
    }

    #[test]
    fn test_hard_float_thumb_saves_vfp() {
        for triple in ["thumbv7em-none-eabihf", "thumbv8m.main-none-eabihf"] {
            assert_eq!(select(&target(triple, "arm")), Ok(Backend::ThumbVfp));
        }
        assert_eq!(Backend::ThumbVfp.cfgs(), ["coru_thumb", "coru_thumb_vfp"]);
        for cfg in Backend::ThumbVfp.cfgs() {
            assert!(CFGS.contains(cfg));
        }
    }

    #[test]
    fn test_arm_state_rejected() {
        assert!(select(&target("armv7-unknown-linux-gnueabihf", "arm")).is_err());
        assert!(select(&target("armv7r-none-eabi", "arm")).is_err());
    }

    #[test]
    fn test_non_elf_rejected() {
        let mut mac = target("aarch64-apple-darwin", "aarch64");
        mac.vendor = "apple";
        mac.os = "macos";
        assert!(select(&mac).is_err());

        let mut win = target("x86_64-pc-windows-msvc", "x86_64");
        win.os = "windows";
        assert!(select(&win).is_err());
    }

    #[test]
    fn test_other_backends_need_no_cfg() {
        assert_eq!(select(&target("x86_64-unknown-linux-gnu", "x86_64")), Ok(Backend::X86_64));
        assert_eq!(select(&target("riscv64gc-unknown-none-elf", "riscv64")), Ok(Backend::Riscv64));
        assert_eq!(select(&target("mips-unknown-linux-gnu", "mips")), Ok(Backend::Mips));
        assert!(Backend::Riscv64.cfgs().is_empty());
        assert!(select(&target("powerpc-unknown-linux-gnu", "powerpc")).is_err());
    }
}
