/// "Resources" refers to objects loaded from outside the renderer and handed to the pipelines.

pub mod shader;
