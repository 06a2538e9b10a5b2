// Copyright (c) 2024 tomoDRGN developers
// Licensed under the GNU General Public License v3.0
// ----------------------------

use anyhow::Result;

fn main() -> Result<()> {
    tomodrgn::run()
}
