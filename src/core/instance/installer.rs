use std::path::{Path, PathBuf};

use tracing::debug;

use super::model::Instance;
use crate::core::archive::extract_zip;
use crate::core::error::{UpdaterError, UpdaterResult};

/// Fixed name the server launch scripts expect the forge patches under.
pub const FORGE_PATCHES_FILE: &str = "lwjgl3ify-forgePatches.jar";

/// Applies filesystem changes to one instance.
///
/// Installs are copies or symlinks depending on the instance. Symlinks are
/// never silently downgraded to copies.
pub struct InstanceInstaller<'a> {
    instance: &'a Instance,
}

impl<'a> InstanceInstaller<'a> {
    pub fn new(instance: &'a Instance) -> Self {
        Self { instance }
    }

    /// Remove an installed file. Already gone counts as success.
    pub fn delete(&self, path: &Path) -> UpdaterResult<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(UpdaterError::io(path, e)),
        }
    }

    /// Place `source` in `mods/` as `file_name`.
    pub fn install_mod(&self, source: &Path, file_name: &str) -> UpdaterResult<PathBuf> {
        let dest = self.instance.mods_dir().join(file_name);
        self.place(source, &dest)?;
        Ok(dest)
    }

    /// Place the forge patches jar at the game directory root, replacing
    /// whatever is there.
    pub fn install_forge_patches(&self, source: &Path) -> UpdaterResult<PathBuf> {
        let dest = self.instance.minecraft_dir.join(FORGE_PATCHES_FILE);
        if dest.symlink_metadata().is_ok() {
            self.delete(&dest)?;
        }
        self.place(source, &dest)?;
        Ok(dest)
    }

    /// Unpack a launcher companion archive into the directory above the
    /// game directory.
    pub fn extract_companion(&self, archive: &Path) -> UpdaterResult<PathBuf> {
        let target = self.instance.launcher_dir();
        extract_zip(archive, &target)?;
        Ok(target)
    }

    fn place(&self, source: &Path, dest: &Path) -> UpdaterResult<()> {
        if self.instance.use_symlinks {
            symlink_file(source, dest).map_err(|e| UpdaterError::io(dest, e))?;
            debug!("Linked {:?} -> {:?}", dest, source);
        } else {
            std::fs::copy(source, dest).map_err(|e| UpdaterError::io(dest, e))?;
            debug!("Copied {:?} -> {:?}", source, dest);
        }
        Ok(())
    }
}

#[cfg(unix)]
fn symlink_file(source: &Path, dest: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, dest)
}

#[cfg(windows)]
fn symlink_file(source: &Path, dest: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(source, dest)
}

#[cfg(not(any(unix, windows)))]
fn symlink_file(_source: &Path, _dest: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "symlinks are not supported on this platform",
    ))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;
    use crate::core::instance::InstanceSide;

    fn setup(side: InstanceSide) -> (tempfile::TempDir, Instance, PathBuf) {
        let temp = tempfile::tempdir().unwrap();
        let minecraft = temp.path().join("pack/.minecraft");
        std::fs::create_dir_all(minecraft.join("mods")).unwrap();
        let source = temp.path().join("Foo-1.0.jar");
        std::fs::write(&source, b"foo").unwrap();
        (temp, Instance::new(minecraft, side), source)
    }

    #[test]
    fn copies_and_deletes_mods() {
        let (_temp, instance, source) = setup(InstanceSide::Client);
        let installer = InstanceInstaller::new(&instance);

        let dest = installer.install_mod(&source, "Foo-1.0.jar").unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"foo");
        assert!(!dest.symlink_metadata().unwrap().file_type().is_symlink());

        installer.delete(&dest).unwrap();
        assert!(!dest.exists());
        installer.delete(&dest).unwrap();
    }

    #[test]
    fn copy_into_missing_directory_fails_loudly() {
        let (_temp, instance, source) = setup(InstanceSide::Client);
        std::fs::remove_dir_all(instance.mods_dir()).unwrap();
        let err = InstanceInstaller::new(&instance)
            .install_mod(&source, "Foo-1.0.jar")
            .unwrap_err();
        assert!(matches!(err, UpdaterError::Io { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_instances_link_to_the_cache() {
        let (_temp, instance, source) = setup(InstanceSide::Server);
        let instance = instance.with_symlinks(true);
        let installer = InstanceInstaller::new(&instance);

        let dest = installer.install_mod(&source, "Foo-1.0.jar").unwrap();
        assert!(dest.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read_link(&dest).unwrap(), source);
    }

    #[test]
    fn forge_patches_replace_the_previous_copy() {
        let (_temp, instance, source) = setup(InstanceSide::Server);
        std::fs::write(instance.minecraft_dir.join(FORGE_PATCHES_FILE), b"old").unwrap();

        let dest = InstanceInstaller::new(&instance)
            .install_forge_patches(&source)
            .unwrap();
        assert_eq!(dest, instance.minecraft_dir.join(FORGE_PATCHES_FILE));
        assert_eq!(std::fs::read(dest).unwrap(), b"foo");
    }

    #[test]
    fn companion_archive_lands_above_the_game_directory() {
        let (temp, instance, _source) = setup(InstanceSide::Client);
        let archive = temp.path().join("lwjgl3ify-2.1-multimc.zip");
        {
            let mut writer = zip::ZipWriter::new(std::fs::File::create(&archive).unwrap());
            writer.start_file("mmc-pack.json", SimpleFileOptions::default()).unwrap();
            writer.write_all(b"{}").unwrap();
            writer.finish().unwrap();
        }

        let target = InstanceInstaller::new(&instance)
            .extract_companion(&archive)
            .unwrap();
        assert_eq!(target, temp.path().join("pack"));
        assert!(temp.path().join("pack/mmc-pack.json").exists());
    }
}
