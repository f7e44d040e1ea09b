use gtk4 as gtk;

use gtk::gio;

/// File picker for the image to recognize
pub fn open_image_dialog() -> gtk::FileDialog {
    let images = gtk::FileFilter::new();
    images.set_name(Some("Images (*.jpg, *.png)"));
    images.add_pattern("*.jpg");
    images.add_pattern("*.jpeg");
    images.add_pattern("*.png");

    let all_files = gtk::FileFilter::new();
    all_files.set_name(Some("All files"));
    all_files.add_pattern("*");

    let filters = gio::ListStore::new::<gtk::FileFilter>();
    filters.append(&images);
    filters.append(&all_files);

    gtk::FileDialog::builder()
        .title("Open Image")
        .modal(true)
        .filters(&filters)
        .default_filter(&images)
        .build()
}
