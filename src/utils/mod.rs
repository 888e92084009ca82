pub mod checksum;
pub mod download;
pub mod extract;

/// The platform key of the running host, e.g. `linux/amd64` or `darwin/arm64`.
pub fn current_platform_key() -> String {
    platform_key(std::env::consts::OS, std::env::consts::ARCH)
}

fn platform_key(os: &str, arch: &str) -> String {
    let os = match os {
        "macos" => "darwin",
        other => other,
    };

    let arch = match arch {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        other => other,
    };

    format!("{}/{}", os, arch)
}

/// Directory name for one platform's downloads. `linux/amd64` becomes `linux-amd64`.
pub fn platform_dir_name(platform_key: &str) -> String {
    platform_key.replace('/', "-")
}
