//! Shared fixtures for integration tests: key lines, patch streams, and a
//! temp-dir context driving the real binary.

#![allow(dead_code)] // not every test file uses every helper
#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_fs::TempDir;

pub const ADMIN_KEY: &str = "ssh-ed25519 YWRtaW4ga2V5 admin@example.com";
pub const CONTRIBUTOR_KEY: &str = "ssh-ed25519 Y29udHJpYnV0b3Iga2V5 contributor@example.com";

pub const TITLE_ONE: &str = "chore: add torch and create random tensor";

pub const SINGLE: &str = "\
From 33c682a1d8cadb791a194b8c2d73d9a2e7395b45 Mon Sep 17 00:00:00 2001
From: Ada Lovelace <ada@example.com>
Date: Tue, 19 Mar 2024 10:12:00 +0100
Subject: [PATCH] chore: add torch and create random tensor

Pull in torch so we can smoke-test tensor creation.
---
 main.py | 2 ++
 1 file changed, 2 insertions(+)

diff --git a/main.py b/main.py
index e69de29..4b8a1a2 100644
--- a/main.py
+++ b/main.py
@@ -0,0 +1,2 @@
+import torch
+x = torch.rand(3)
--
2.44.0
";

/// `SINGLE` plus a second, distinct commit.
pub fn two_patch_stream() -> String {
    let second = SINGLE
        .replace(
            "33c682a1d8cadb791a194b8c2d73d9a2e7395b45",
            "1668484d1f2b2d3ca8d2a5e54b0c9d8e7f6a5b4c",
        )
        .replace(TITLE_ONE, "feat: normalize tensor")
        .replace("+import torch", "+import numpy");
    format!("{SINGLE}{second}")
}

/// A rework of [`two_patch_stream`]: the first patch is content-identical,
/// the second carries the same title but different hunk content.
pub fn reworked_stream() -> String {
    let second = SINGLE
        .replace(
            "33c682a1d8cadb791a194b8c2d73d9a2e7395b45",
            "9a41cf0d2e71b3a4c5d6e7f8091a2b3c4d5e6f70",
        )
        .replace(TITLE_ONE, "feat: normalize tensor")
        .replace("+import torch", "+import numpy")
        .replace("+x = torch.rand(3)", "+x = numpy.random.rand(3)");
    format!("{SINGLE}{second}")
}

pub struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let config = format!(
            "data_dir = {:?}\nadmins = [\"{ADMIN_KEY}\"]\ncreate_repo = \"admin\"\n",
            temp_dir.path()
        );
        std::fs::write(temp_dir.path().join("patchbay.toml"), config)
            .expect("failed to write config");
        Self { temp_dir }
    }

    pub fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("patchbay.toml")
    }

    fn bin(&self) -> Command {
        let mut cmd = Command::cargo_bin("patchbay").expect("failed to find binary");
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("PATCHBAY_DATA_DIR");
        cmd
    }

    pub fn init(&self) -> assert_cmd::assert::Assert {
        let mut cmd = self.bin();
        cmd.arg("init")
            .arg("--config")
            .arg(self.config_path())
            .assert()
    }

    pub fn ban(&self, pubkey: &str) -> assert_cmd::assert::Assert {
        let mut cmd = self.bin();
        cmd.arg("ban")
            .arg("--pubkey")
            .arg(pubkey)
            .arg("--config")
            .arg(self.config_path())
            .assert()
    }

    /// Runs `patchbay shell` the way an sshd ForceCommand entry would,
    /// with the client command in `SSH_ORIGINAL_COMMAND`.
    pub fn shell(&self, pubkey: &str, command: &str, stdin: &str) -> assert_cmd::assert::Assert {
        let mut cmd = self.bin();
        cmd.arg("shell")
            .arg("--pubkey")
            .arg(pubkey)
            .arg("--config")
            .arg(self.config_path())
            .env("SSH_ORIGINAL_COMMAND", command)
            .write_stdin(stdin)
            .assert()
    }
}
