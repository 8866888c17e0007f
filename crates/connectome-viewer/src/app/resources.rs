use bevy::prelude::Resource;
use crossbeam_channel::Receiver;

use crate::net::Incoming;
use crate::util::config::ViewerConfig;

#[derive(Resource)]
pub struct NetRx(pub Receiver<Incoming>);

#[derive(Resource, Clone, Default)]
pub struct Settings(pub ViewerConfig);
