pub mod check;
pub mod init;
pub mod play;
pub mod progress;
pub mod show;

use std::path::Path;

use hotaru_script::SceneScript;

/// Load a scene script, folding failures into a printable message.
pub fn load_script(path: &Path) -> Result<SceneScript, String> {
    SceneScript::load(path).map_err(|e| e.to_string())
}
