use std::collections::HashSet;

use gem_battle_core::{CellCoord, Cluster, GemKind, Grid, Run};
use gem_battle_system_cluster_merger::ClusterMerger;
use gem_battle_system_grid_scanner::GridScanner;
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn resolve(grid: &Grid) -> (Vec<Run>, Vec<Cluster>) {
    let mut runs = Vec::new();
    GridScanner::new().scan(grid, &mut runs);
    let mut clusters = Vec::new();
    ClusterMerger::new().merge(grid, &runs, &mut clusters);
    (runs, clusters)
}

fn assert_single_cluster_of_five(notation: &str) {
    let grid: Grid = notation.parse().expect("valid notation");
    let (runs, clusters) = resolve(&grid);

    assert_eq!(runs.len(), 2, "expected two perpendicular runs");
    assert_eq!(clusters.len(), 1, "perpendicular runs must merge");
    assert_eq!(clusters[0].kind(), GemKind::Fire);
    assert_eq!(clusters[0].count(), 5);
}

#[test]
fn l_shape_merges_into_one_cluster() {
    assert_single_cluster_of_five("$$$~#@ $#@~&# $@#&~@ #~&@#~ ~&@#~&");
}

#[test]
fn t_shape_merges_into_one_cluster() {
    assert_single_cluster_of_five("$$$~#@ ~$#@~& #$@&~# @~&#@~ &#~@&@");
}

#[test]
fn plus_shape_merges_into_one_cluster() {
    let grid: Grid = "~#@~#@ #@$&~# @$$$&~ ~&$@#& #@~#@~".parse().expect("valid");
    let (_, clusters) = resolve(&grid);

    assert_eq!(clusters.len(), 1);
    let cells = clusters[0].cells();
    assert_eq!(cells.len(), 5);
    assert!(clusters[0].contains(CellCoord::new(2, 2)));
    assert!(clusters[0].contains(CellCoord::new(2, 1)));
    assert!(clusters[0].contains(CellCoord::new(1, 2)));
}

#[test]
fn clusters_partition_matched_cells() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed_cafe);
    let mut boards_with_matches = 0;

    for _ in 0..500 {
        let grid = Grid::from_fn(|_| *GemKind::ALL.choose(&mut rng).expect("kinds"));
        let (runs, clusters) = resolve(&grid);

        let matched: HashSet<CellCoord> = runs.iter().flat_map(Run::cells).collect();
        let mut covered = HashSet::new();
        for cluster in &clusters {
            assert!(cluster.count() >= 3, "cluster smaller than a run: {cluster:?}");
            for &cell in cluster.cells() {
                assert_eq!(grid.gem(cell), Some(cluster.kind()));
                assert!(covered.insert(cell), "cell {cell:?} appears in two clusters");
            }
        }
        assert_eq!(covered, matched);

        for (index, cluster) in clusters.iter().enumerate() {
            for other in &clusters[index + 1..] {
                if cluster.kind() != other.kind() {
                    continue;
                }
                let touching = cluster
                    .cells()
                    .iter()
                    .any(|cell| cell.neighbors().any(|neighbor| other.contains(neighbor)));
                assert!(!touching, "adjacent same-kind clusters were not merged");
            }
        }

        if !clusters.is_empty() {
            boards_with_matches += 1;
        }
    }

    assert!(boards_with_matches > 0, "sample never produced a match");
}

#[test]
fn merging_is_deterministic() {
    let grid: Grid = "$$$$&& ~$~~~& @$#@~& #@#@#@ @#@#@#".parse().expect("valid");
    let (_, first) = resolve(&grid);
    let (_, second) = resolve(&grid);

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}
