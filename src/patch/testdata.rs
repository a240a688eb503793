//! Shared mbox fixtures for parser, range-diff and store tests.

pub(crate) const TITLE_ONE: &str = "chore: add torch and create random tensor";
pub(crate) const TITLE_TWO: &str = "feat: normalize tensor";

pub(crate) const SINGLE: &str = "\
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

pub(crate) const COVER_ONLY: &str = "\
From 0000000000000000000000000000000000000000 Mon Sep 17 00:00:00 2001
From: Ada Lovelace <ada@example.com>
Date: Tue, 19 Mar 2024 10:00:00 +0100
Subject: [PATCH 0/2] series overview

Here is what the series does.
--
2.44.0
";

/// Two distinct patches: `SINGLE` followed by a second commit.
pub(crate) fn two_patch_stream() -> String {
    let second = SINGLE
        .replace(
            "33c682a1d8cadb791a194b8c2d73d9a2e7395b45",
            "1668484d1f2b2d3ca8d2a5e54b0c9d8e7f6a5b4c",
        )
        .replace(TITLE_ONE, TITLE_TWO)
        .replace("+import torch", "+import numpy");
    format!("{SINGLE}{second}")
}

/// A rework of [`two_patch_stream`]: the first patch is content-identical,
/// the second carries the same title but different hunk content.
pub(crate) fn reworked_stream() -> String {
    let second = SINGLE
        .replace(
            "33c682a1d8cadb791a194b8c2d73d9a2e7395b45",
            "9a41cf0d2e71b3a4c5d6e7f8091a2b3c4d5e6f70",
        )
        .replace(TITLE_ONE, TITLE_TWO)
        .replace("+import torch", "+import numpy")
        .replace("+x = torch.rand(3)", "+x = numpy.random.rand(3)");
    format!("{SINGLE}{second}")
}
