use cucumber::given;

use crate::cucumber::{world::GroupBuySystem, GroupBuyWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut GroupBuyWorld) {
    let system = GroupBuySystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a campaign with a target of {int} units at {int} IDR each")]
async fn new_campaign(world: &mut GroupBuyWorld, target: i64, price: i64) {
    world.create_campaign(price, target).await;
}
