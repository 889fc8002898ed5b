/// Common test utilities and helpers for gecko-import tests

use assert_fs::prelude::*;
use assert_fs::TempDir;
use std::path::PathBuf;

/// A scratch workspace holding a fake Gecko tree, a gecko-media tree and
/// the manifests describing the import
pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self { temp_dir }
    }

    pub fn src_dir(&self) -> PathBuf {
        self.temp_dir.child("gecko").path().to_path_buf()
    }

    pub fn dst_dir(&self) -> PathBuf {
        self.temp_dir.child("gecko-media").path().to_path_buf()
    }

    pub fn write(&self, relative: &str, content: &str) {
        self.temp_dir
            .child(relative)
            .write_str(content)
            .expect("Failed to write fixture file");
    }

    /// Config pinning the object directory so tests run on any host
    pub fn create_test_config(&self) -> PathBuf {
        let config = self.temp_dir.child("config.yml");
        config
            .write_str("objdir: obj-test\n")
            .expect("Failed to write test config");
        config.path().to_path_buf()
    }

    /// A small but complete Gecko tree with matching manifests
    pub fn create_gecko_tree(&self) {
        self.write(
            "data/header_files.json",
            r#"{"mozilla/Assertions.h": "mfbt/Assertions.h"}"#,
        );
        self.write(
            "data/src_files.json",
            r#"["xpcom/string/nsString.cpp", "xpcom/string/nsTSubstring.cpp", "xpcom/string/nsUTF8UtilsSSE2.cpp"]"#,
        );
        self.write("data/objdir_files.json", r#"["mozilla-config.h"]"#);
        self.write(
            "data/glue_files.json",
            r#"{"nsThread.cpp": "xpcom/threads/nsThread.cpp"}"#,
        );

        self.write("gecko/mfbt/Assertions.h", "#define MOZ_ASSERT(x)\n");
        self.write("gecko/xpcom/string/nsString.cpp", "");
        self.write("gecko/xpcom/string/nsTSubstring.cpp", "");
        self.write("gecko/xpcom/string/nsUTF8UtilsSSE2.cpp", "");
        self.write("gecko/obj-test/dist/include/mozilla-config.h", "");

        let prefs = "pref(\"media.autoplay.enabled\", true);\n\
                     pref(\"browser.x\", 1);\n\
                     #ifdef XP_WIN\n\
                     pref(\"gfx.direct2d\", true);\n\
                     #endif\n";
        self.write("gecko/modules/libpref/init/all.js", prefs);
        self.write("gecko/browser/app/profile/firefox.js", prefs);
        self.write("gecko/mobile/android/app/mobile.js", prefs);

        self.write("gecko-media/glue/GeckoMedia.cpp", "");
    }
}

/// Assertion helpers for test validation
pub fn assert_contains_all(text: &str, expected: &[&str]) {
    for item in expected {
        assert!(
            text.contains(item),
            "Expected text to contain '{}', but it didn't. Text: {}",
            item,
            text
        );
    }
}
