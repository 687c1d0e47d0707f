use cucumber::given;

use crate::cucumber::{MspWorld, PaymentSystem};

#[given("a fresh install")]
async fn fresh_database(world: &mut MspWorld) {
    let system = PaymentSystem::new().await;
    world.system = Some(system);
}
