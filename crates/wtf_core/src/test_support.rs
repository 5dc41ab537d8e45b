//! On-disk `WTF` fixtures for tests.

use crate::flavor::Flavor;
use crate::install::{WowInstall, ACCOUNT_DIR, WTF_DIR};
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

pub struct WtfFixture {
    _temp: TempDir,
    root: Utf8PathBuf,
}

impl WtfFixture {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        Self { _temp: temp, root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn install(&self) -> WowInstall {
        WowInstall::new(self.root.clone())
    }

    pub fn account_root(&self, flavor: &Flavor) -> Utf8PathBuf {
        self.root.join(flavor.as_str()).join(WTF_DIR).join(ACCOUNT_DIR)
    }

    pub fn account_dir(&self, flavor: &Flavor, account: &str) -> Utf8PathBuf {
        self.account_root(flavor).join(account)
    }

    pub fn character(&self, flavor: &Flavor, account: &str, realm: &str, name: &str) -> Utf8PathBuf {
        let dir = self.account_dir(flavor, account).join(realm).join(name);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub fn account_file(&self, flavor: &Flavor, account: &str, rel: &str, content: &str) -> Utf8PathBuf {
        write_file(&self.account_dir(flavor, account).join(rel), content)
    }

    pub fn realm_file(
        &self,
        flavor: &Flavor,
        account: &str,
        realm: &str,
        rel: &str,
        content: &str,
    ) -> Utf8PathBuf {
        write_file(&self.account_dir(flavor, account).join(realm).join(rel), content)
    }
}

pub fn write_file(path: &Utf8Path, content: &str) -> Utf8PathBuf {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
    path.to_owned()
}
