//! End-to-end scenarios against a throwaway backing file, built with
//! `tempfile` the way the reference pack's user-space FUSE drivers test
//! themselves.

use sfs::{DescriptorType, Sfs};
use tempfile::NamedTempFile;

fn formatted_fs(size: u64) -> Sfs {
    let file = NamedTempFile::new().expect("create temp file");
    file.as_file().set_len(size).expect("set temp file size");
    let path = file.into_temp_path();
    // `mkfs`/`mount` both reopen the path; keep it alive past this
    // function by leaking the `TempPath` guard into a regular path.
    let path = path.keep().expect("persist temp path");
    Sfs::mkfs(&path).expect("mkfs");
    Sfs::mount(&path).expect("mount")
}

#[test]
fn scenario_1_fresh_mount_lists_dot_and_dotdot() {
    let fs = formatted_fs(64 * 1024);
    assert_eq!(fs.pwd(), "/");
    let entries = fs.list("/").expect("list /");
    let mut names: Vec<_> = entries.iter().map(|e| e.name.clone()).collect();
    names.sort();
    assert_eq!(names, vec![".", ".."]);
}

#[test]
fn scenario_2_write_then_read_round_trips() {
    let mut fs = formatted_fs(64 * 1024);
    fs.create_file("/a").expect("create /a");
    let fid = fs.open_file("/a").expect("open /a");
    fs.write_file(fid, 0, b"hello").expect("write");
    fs.close_file(fid).expect("close");

    assert_eq!(fs.get_file_size("/a").expect("size"), 5);

    let fid = fs.open_file("/a").expect("reopen /a");
    let mut buf = [0u8; 5];
    fs.read_file(fid, 0, &mut buf).expect("read");
    assert_eq!(&buf, b"hello");
    fs.close_file(fid).expect("close");
}

#[test]
fn scenario_3_cd_and_relative_paths() {
    let mut fs = formatted_fs(64 * 1024);
    fs.make_dir("/d").expect("mkdir /d");
    fs.cd("/d").expect("cd /d");
    assert_eq!(fs.pwd(), "/d");

    fs.create_file("x").expect("create x relative to /d");
    let names: Vec<_> = fs.list(".").expect("list .").into_iter().map(|e| e.name).collect();
    assert!(names.contains(&"x".to_string()));

    fs.cd("..").expect("cd ..");
    assert_eq!(fs.pwd(), "/");
    let names: Vec<_> = fs.list("/d").expect("list /d").into_iter().map(|e| e.name).collect();
    assert!(names.contains(&"x".to_string()));
}

#[test]
fn scenario_4_hard_links_share_a_descriptor() {
    let mut fs = formatted_fs(64 * 1024);
    fs.create_file("/a").expect("create /a");
    fs.mklink("/a", "/b").expect("link /a -> /b");

    let stat_id = fs
        .list("/")
        .expect("list /")
        .into_iter()
        .find(|e| e.name == "a")
        .expect("a present")
        .descr_id;
    let stat = fs.filestat(stat_id).expect("filestat");
    assert_eq!(stat.links_num, 2);

    fs.rmlink("/a").expect("rmlink /a");
    let fid = fs.open_file("/b").expect("open /b after /a removed");
    let mut buf = [0u8; 0];
    fs.read_file(fid, 0, &mut buf).expect("read /b still works");
    fs.close_file(fid).expect("close");

    fs.rmlink("/b").expect("rmlink /b frees the descriptor");
    assert!(fs.filestat(stat_id).is_err());
}

#[test]
fn scenario_5_symlink_round_trip() {
    let mut fs = formatted_fs(64 * 1024);
    fs.create_file("/t").expect("create /t");
    let fid = fs.open_file("/t").expect("open /t");
    fs.write_file(fid, 0, b"hi").expect("write /t");
    fs.close_file(fid).expect("close");

    fs.mksymlink("/t", "/s").expect("symlink /t <- /s");
    let entries = fs.list("/").expect("list /");
    let s = entries.iter().find(|e| e.name == "s").expect("s present");
    assert_eq!(s.type_, DescriptorType::Link);
    assert_eq!(s.link_target.as_deref(), Some("/t"));

    let fid = fs.open_file("/s").expect("open /s reads the link's raw bytes");
    let mut buf = [0u8; 2];
    fs.read_file(fid, 0, &mut buf).expect("read link target bytes");
    assert_eq!(&buf, b"/t");
    fs.close_file(fid).expect("close");

    fs.rmlink("/s").expect("rmlink /s removes the symlink, not /t");
    assert!(fs.get_file_size("/t").is_ok());
}

#[test]
fn scenario_6_truncate_grows_and_shrinks() {
    let mut fs = formatted_fs(64 * 1024);
    fs.create_file("/f").expect("create /f");
    fs.trancate("/f", 1024).expect("grow to 1024");
    assert_eq!(fs.get_file_size("/f").expect("size"), 1024);

    let fid = fs.open_file("/f").expect("open /f");
    let mut buf = vec![0xffu8; 1024];
    fs.read_file(fid, 0, &mut buf).expect("read grown file");
    fs.close_file(fid).expect("close");
    assert!(buf.iter().all(|&b| b == 0), "grown region must read back as zeros");

    fs.trancate("/f", 10).expect("shrink to 10");
    assert_eq!(fs.get_file_size("/f").expect("size"), 10);
}

#[test]
fn mkfs_rejects_a_size_not_a_multiple_of_block_size() {
    let file = NamedTempFile::new().expect("create temp file");
    file.as_file().set_len(1000).expect("odd size");
    let path = file.into_temp_path().keep().expect("persist");
    assert!(Sfs::mkfs(&path).is_err());
}

#[test]
fn remove_dir_rejects_non_empty_directory() {
    let mut fs = formatted_fs(64 * 1024);
    fs.make_dir("/d").expect("mkdir /d");
    fs.create_file("/d/x").expect("create /d/x");
    assert!(fs.remove_dir("/d").is_err());
}

#[test]
fn remove_dir_frees_the_descriptor_and_its_blocks() {
    let mut fs = formatted_fs(64 * 1024);
    let dir_id = fs.make_dir("/d").expect("mkdir /d");
    assert!(fs.filestat(dir_id).is_ok());

    fs.remove_dir("/d").expect("rmdir /d");
    assert!(
        fs.filestat(dir_id).is_err(),
        "descriptor must be freed (type reset to Free), not left as a zombie"
    );

    // The freed descriptor slot is the lowest free one; a fresh directory
    // reuses it, proving `find_free_descriptor` sees it as free again and
    // the slot wasn't leaked.
    let reused_id = fs.make_dir("/e").expect("mkdir /e");
    assert_eq!(reused_id, dir_id, "descriptor slot should have been reclaimed");

    let stat = fs.filestat(reused_id).expect("filestat /e");
    assert_eq!(stat.type_, DescriptorType::Dir);
    assert_eq!(stat.links_num, 1);
}

#[test]
fn create_existing_path_fails() {
    let mut fs = formatted_fs(64 * 1024);
    fs.create_file("/a").expect("create /a");
    assert!(fs.create_file("/a").is_err());
}

#[test]
fn mount_unmount_round_trip_preserves_bytes() {
    let file = NamedTempFile::new().expect("create temp file");
    file.as_file().set_len(64 * 1024).expect("size");
    let path = file.into_temp_path().keep().expect("persist");
    Sfs::mkfs(&path).expect("mkfs");

    let before = std::fs::read(&path).expect("read backing file");
    let fs = Sfs::mount(&path).expect("mount");
    fs.umount().expect("umount");
    let after = std::fs::read(&path).expect("read backing file");
    assert_eq!(before, after);
}
