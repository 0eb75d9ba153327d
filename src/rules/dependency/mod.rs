//
//  mod.rs
//  Archlint
//
//  Created by hak (tharun)
//

pub mod allow_list;
pub mod no_circular;
pub mod no_cross_feature;
pub mod no_cross_layer;
