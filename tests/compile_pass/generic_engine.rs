// ABOUTME: Compile-pass test for downstream use of the engine traits.
// ABOUTME: Sealed traits can still be named as bounds and called through generics.

use dockwire::engine::{EngineClient, FullEngine};
use dockwire::types::{ContainerId, ImageId};

async fn running_count<E: FullEngine>(engine: &E) -> dockwire::Result<usize> {
    engine.ping().await?;
    let listed = engine.list_containers(false).await?;
    Ok(listed.len())
}

fn accepts_ids(_container: &ContainerId, _image: &ImageId) {}

fn assert_engine<E: FullEngine + Clone + Send + Sync + 'static>() {}

fn main() {
    assert_engine::<EngineClient>();
    accepts_ids(&ContainerId::new("abc"), &ImageId::new("sha256:def"));
    let _ = running_count::<EngineClient>;
}
